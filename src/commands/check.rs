// src/commands/check.rs

//! Check command - validate a formula without building

use super::load_formula;
use anyhow::{Context, Result};
use cellar::recipe::validate_formula;

pub fn cmd_check(formula_path: &str) -> Result<()> {
    let formula = load_formula(formula_path)?;
    println!("Formula: {} {}", formula.package.name, formula.pkg_version());

    let warnings = validate_formula(&formula).with_context(|| "Formula validation failed")?;
    for warning in &warnings {
        println!("Warning: {}", warning);
    }

    println!(
        "  {} bottle(s), {} dependencies, {} resource(s), {} install step(s), {} test check(s)",
        formula.bottles.len(),
        formula.dependencies.len(),
        formula.resources.len(),
        formula.install.len(),
        formula.tests.len()
    );

    println!("Formula validation passed");
    if warnings.is_empty() {
        println!("[OK] No issues found");
    } else {
        println!("[OK] {} warning(s)", warnings.len());
    }

    Ok(())
}
