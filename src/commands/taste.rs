// src/commands/taste.rs

//! Taste command - run the smoke test against an installed keg

use super::{load_formula, Globals};
use anyhow::{Context, Result};
use cellar::recipe::Kitchen;

pub fn cmd_taste(
    globals: &Globals,
    formula_path: &str,
    head: bool,
    python: Option<String>,
    site_packages: Option<String>,
) -> Result<()> {
    let formula = load_formula(formula_path)?;

    let mut config = globals.kitchen_config();
    config.site_packages = site_packages;
    if let Some(python) = python {
        config.python = python;
    }
    let kitchen = Kitchen::new(config);

    if formula.tests.is_empty() {
        println!("{} has no test checks", formula.package.name);
        return Ok(());
    }

    let report = kitchen
        .taste(&formula, head)
        .with_context(|| format!("Smoke test of {} failed", formula.package.name))?;

    for (i, line) in report.passed.iter().enumerate() {
        println!("ok {} - {}", i + 1, line);
    }
    println!("[OK] {} check(s) passed", report.len());

    Ok(())
}
