// src/commands/info.rs

//! Info command - show formula metadata and install state

use super::{load_formula, Globals};
use anyhow::Result;
use cellar::recipe::receipt::{BuiltFrom, InstallReceipt};
use cellar::recipe::{DepKind, Kitchen};

pub fn cmd_info(globals: &Globals, formula_path: &str) -> Result<()> {
    let formula = load_formula(formula_path)?;
    let pkg = &formula.package;

    println!("{}: {}", pkg.name, formula.pkg_version());
    if let Some(desc) = &pkg.description {
        println!("{}", desc);
    }
    if let Some(homepage) = &pkg.homepage {
        println!("{}", homepage);
    }
    if let Some(license) = &pkg.license {
        println!("License: {}", license);
    }

    println!("\n==> Source");
    println!("  {}", formula.source_url()?);
    println!("  {}", formula.source.checksum);
    if let Some(head) = &formula.head {
        println!("  head: {} ({})", head.url, head.branch);
    }

    if !formula.dependencies.is_empty() {
        println!("\n==> Dependencies");
        for kind in [DepKind::Build, DepKind::Runtime] {
            let names: Vec<String> = formula
                .dependencies
                .iter()
                .filter(|d| d.kind == kind)
                .map(|d| match (d.uses_from_macos, &d.since) {
                    (true, Some(since)) => format!("{} (macOS before {})", d.name, since),
                    (true, None) => format!("{} (not on macOS)", d.name),
                    _ => d.name.clone(),
                })
                .collect();
            if !names.is_empty() {
                let label = if kind == DepKind::Build { "Build" } else { "Required" };
                println!("  {}: {}", label, names.join(", "));
            }
        }
    }

    if !formula.resources.is_empty() {
        println!("\n==> Resources");
        for resource in &formula.resources {
            println!("  {}: {}", resource.name, resource.filename());
        }
    }

    if !formula.bottles.is_empty() {
        println!("\n==> Bottles");
        for bottle in &formula.bottles {
            println!("  {:<16} {}", bottle.tag, bottle.cellar);
        }
    }

    let kitchen = Kitchen::new(globals.kitchen_config());
    println!("\n==> Installed");
    let mut installed = false;
    for head in [false, true] {
        let prefix = kitchen.paths_for(&formula, head).prefix;
        if !prefix.exists() {
            continue;
        }
        installed = true;
        match InstallReceipt::read(&prefix) {
            Ok(receipt) => {
                let from = match &receipt.built_from {
                    BuiltFrom::Source { .. } => "source".to_string(),
                    BuiltFrom::Head { branch, .. } => format!("head ({})", branch),
                };
                println!(
                    "  {} (built from {} on {}, {})",
                    prefix.display(),
                    from,
                    receipt.platform,
                    receipt.installed_at.format("%Y-%m-%d %H:%M UTC")
                );
            }
            Err(_) => println!("  {} (no install receipt)", prefix.display()),
        }
    }
    if !installed {
        println!("  Not installed");
    }

    Ok(())
}
