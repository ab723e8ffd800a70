// src/main.rs

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let ctx = commands::Globals::new(&cli.root, cli.cache.as_deref());

    match cli.command {
        Commands::Cook {
            formula,
            head,
            jobs,
            keep_builddir,
            skip_deps,
            python,
            site_packages,
            no_test,
        } => commands::cmd_cook(
            &ctx,
            &formula,
            commands::CookArgs {
                head,
                jobs,
                keep_builddir,
                skip_deps,
                python,
                site_packages,
                no_test,
            },
        ),
        Commands::Fetch { formula } => commands::cmd_fetch(&ctx, &formula),
        Commands::Check { formula } => commands::cmd_check(&formula),
        Commands::Taste {
            formula,
            head,
            python,
            site_packages,
        } => commands::cmd_taste(&ctx, &formula, head, python, site_packages),
        Commands::Bottle { formula, tag } => commands::cmd_bottle(&formula, tag.as_deref()),
        Commands::Livecheck { formula } => commands::cmd_livecheck(&formula),
        Commands::Info { formula } => commands::cmd_info(&ctx, &formula),
        Commands::Caveats {
            formula,
            python,
            site_packages,
        } => commands::cmd_caveats(&ctx, &formula, python, site_packages),
    }
}
