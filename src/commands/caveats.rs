// src/commands/caveats.rs

//! Caveats command - print post-install notes

use super::{load_formula, Globals};
use anyhow::{Context, Result};
use cellar::recipe::Kitchen;

pub fn cmd_caveats(
    globals: &Globals,
    formula_path: &str,
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

    match kitchen
        .caveats(&formula, false)
        .with_context(|| format!("Failed to render caveats of {}", formula.package.name))?
    {
        Some(text) => println!("{}", text.trim_end()),
        None => println!("{} has no caveats", formula.package.name),
    }

    Ok(())
}
