// src/commands/livecheck.rs

//! Livecheck command - compare the formula version against upstream

use super::load_formula;
use anyhow::{Context, Result};
use cellar::recipe::kitchen::fetch_text;
use cellar::recipe::livecheck;

pub fn cmd_livecheck(formula_path: &str) -> Result<()> {
    let formula = load_formula(formula_path)?;

    let report = livecheck::check(&formula, fetch_text)
        .with_context(|| format!("Livecheck of {} failed", formula.package.name))?;

    match &report.latest {
        Some(latest) if report.is_outdated() => {
            println!("{}: {} ==> {}", formula.package.name, report.current, latest);
        }
        Some(latest) => {
            println!("{}: {} (latest upstream: {})", formula.package.name, report.current, latest);
        }
        None => {
            println!(
                "{}: {} (no versions matched the livecheck regex)",
                formula.package.name, report.current
            );
        }
    }

    Ok(())
}
