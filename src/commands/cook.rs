// src/commands/cook.rs

//! Cook command - build a formula from source into its keg

use super::{load_formula, Globals};
use anyhow::{Context, Result};
use cellar::platform::Platform;
use cellar::recipe::{validate_formula, CookOptions, Kitchen};
use tracing::info;

/// Flags of `cellar cook`
#[derive(Debug, Default)]
pub struct CookArgs {
    pub head: bool,
    pub jobs: Option<u32>,
    pub keep_builddir: bool,
    pub skip_deps: bool,
    pub python: Option<String>,
    pub site_packages: Option<String>,
    pub no_test: bool,
}

/// Cook a formula and taste the result
pub fn cmd_cook(globals: &Globals, formula_path: &str, args: CookArgs) -> Result<()> {
    println!("Reading formula: {}", formula_path);
    let formula = load_formula(formula_path)?;
    println!("Formula: {} {}", formula.package.name, formula.pkg_version());

    let warnings = validate_formula(&formula).with_context(|| "Formula validation failed")?;
    for warning in &warnings {
        println!("Warning: {}", warning);
    }

    let platform = Platform::detect().with_context(|| "Failed to detect platform")?;
    if let Some(bottle) = formula.bottle_for(&platform) {
        println!(
            "Note: a {} bottle is published ({}); cooking from source anyway",
            bottle.tag, bottle.cellar
        );
    }

    let mut config = globals.kitchen_config();
    config.keep_builddir = args.keep_builddir;
    config.site_packages = args.site_packages;
    if let Some(j) = args.jobs {
        config.jobs = j;
    }
    if let Some(python) = args.python {
        config.python = python;
    }

    let kitchen = Kitchen::new(config);

    if kitchen.sources_cached(&formula) {
        println!("  - Sources already cached (offline build possible)");
    }
    println!(
        "Cooking for {} with {} parallel jobs...",
        platform,
        kitchen.config().jobs
    );

    let options = CookOptions {
        head: args.head,
        platform,
        skip_deps: args.skip_deps,
    };
    let result = kitchen
        .cook(&formula, &options)
        .with_context(|| format!("Failed to cook {}", formula.package.name))?;

    println!("\n[COMPLETE] Cooked: {}", result.prefix.display());
    println!("  {} entries, receipt at {}", result.layout.len(), result.receipt_path.display());
    println!("  linked {} -> {}", result.opt_prefix.display(), result.prefix.display());

    for binding in &result.bindings {
        match binding.search_path() {
            Some(path) => println!(
                "  python binding (isolated): add {} to PYTHONPATH",
                path.display()
            ),
            None => println!(
                "  python binding (shared): {} (not added to the interpreter's site; link or .pth it yourself)",
                binding.site_dir().display()
            ),
        }
    }

    if let Some(dir) = &result.build_dir {
        println!("  build directory kept at {}", dir.display());
    }

    if !result.warnings.is_empty() {
        println!("\nBuild warnings:");
        for warning in &result.warnings {
            println!("  - {}", warning);
        }
    }

    if let Some(caveats) = &result.caveats {
        println!("\n==> Caveats\n{}", caveats.trim_end());
    }

    info!(
        "Successfully cooked {} into {}",
        formula.package.name,
        result.prefix.display()
    );

    if args.no_test || formula.tests.is_empty() {
        return Ok(());
    }

    println!("\nTasting {}...", formula.package.name);
    let report = kitchen
        .taste(&formula, args.head)
        .with_context(|| format!("Smoke test of {} failed", formula.package.name))?;
    println!("[OK] {} check(s) passed", report.len());

    Ok(())
}
