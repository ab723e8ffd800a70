// src/commands/bottle.rs

//! Bottle command - select the prebuilt bottle for a platform

use super::load_formula;
use anyhow::{Context, Result};
use cellar::platform::Platform;

pub fn cmd_bottle(formula_path: &str, tag: Option<&str>) -> Result<()> {
    let formula = load_formula(formula_path)?;

    let platform = match tag {
        Some(tag) => Platform::from_bottle_tag(tag)
            .with_context(|| format!("Unknown bottle tag: {}", tag))?,
        None => Platform::detect().with_context(|| "Failed to detect platform")?,
    };

    match formula.bottle_for(&platform) {
        Some(bottle) => {
            println!("{} {}", formula.package.name, formula.pkg_version());
            println!("  tag:    {}", bottle.tag);
            println!("  cellar: {}", bottle.cellar);
            println!("  sha256: {}", bottle.sha256);
        }
        None => {
            println!(
                "No bottle for {} ({}); it must be cooked from source",
                platform,
                platform.bottle_tag()
            );
            if !formula.bottles.is_empty() {
                let tags: Vec<&str> = formula.bottles.iter().map(|b| b.tag.as_str()).collect();
                println!("Available: {}", tags.join(", "));
            }
        }
    }

    Ok(())
}
