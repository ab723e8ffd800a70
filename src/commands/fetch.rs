// src/commands/fetch.rs

//! Fetch command - download and verify sources only

use super::{load_formula, Globals};
use anyhow::{Context, Result};
use cellar::recipe::Kitchen;

pub fn cmd_fetch(globals: &Globals, formula_path: &str) -> Result<()> {
    let formula = load_formula(formula_path)?;
    let kitchen = Kitchen::new(globals.kitchen_config());

    println!("Fetching sources for {}...", formula.package.name);
    let sources = kitchen
        .fetch(&formula)
        .with_context(|| format!("Failed to fetch sources for {}", formula.package.name))?;

    println!("\n[COMPLETE] Fetched {} source file(s):", sources.len());
    for source in &sources {
        println!("  - {}", source.display());
    }

    if kitchen.sources_cached(&formula) {
        println!("\n[OK] All sources are cached. Ready for offline build.");
    }

    Ok(())
}
