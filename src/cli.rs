// src/cli.rs
//! CLI definitions for cellar
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cellar")]
#[command(author = "Cellar Contributors")]
#[command(version)]
#[command(about = "Cook, verify and inspect source formulas", long_about = None)]
pub struct Cli {
    /// Root holding Cellar/ and opt/
    #[arg(long, global = true, env = "CELLAR_ROOT", default_value = "/opt/cellar")]
    pub root: String,

    /// Directory for downloaded sources
    #[arg(long, global = true, env = "CELLAR_CACHE")]
    pub cache: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a formula from source and install it into its keg
    Cook {
        /// Path to the formula file
        formula: String,

        /// Build the development head instead of the release
        #[arg(long)]
        head: bool,

        /// Number of parallel build jobs
        #[arg(short, long)]
        jobs: Option<u32>,

        /// Keep build directory after completion
        #[arg(long)]
        keep_builddir: bool,

        /// Do not check that dependencies are installed
        #[arg(long)]
        skip_deps: bool,

        /// Python interpreter for binding steps
        #[arg(long)]
        python: Option<String>,

        /// Relative site-packages directory (skips asking the interpreter)
        #[arg(long)]
        site_packages: Option<String>,

        /// Skip the smoke test after installing
        #[arg(long)]
        no_test: bool,
    },

    /// Download and verify sources without building
    Fetch {
        /// Path to the formula file
        formula: String,
    },

    /// Parse and validate a formula
    Check {
        /// Path to the formula file
        formula: String,
    },

    /// Run a formula's smoke test against its installed keg
    Taste {
        /// Path to the formula file
        formula: String,

        /// Test the head keg
        #[arg(long)]
        head: bool,

        /// Python interpreter the test uses
        #[arg(long)]
        python: Option<String>,

        /// Relative site-packages directory (skips asking the interpreter)
        #[arg(long)]
        site_packages: Option<String>,
    },

    /// Show the bottle published for a platform
    Bottle {
        /// Path to the formula file
        formula: String,

        /// Platform tag (default: this machine)
        #[arg(long)]
        tag: Option<String>,
    },

    /// Check upstream for newer releases
    Livecheck {
        /// Path to the formula file
        formula: String,
    },

    /// Show formula details and install state
    Info {
        /// Path to the formula file
        formula: String,
    },

    /// Print a formula's post-install notes
    Caveats {
        /// Path to the formula file
        formula: String,

        /// Python interpreter used to locate site-packages
        #[arg(long)]
        python: Option<String>,

        /// Relative site-packages directory (skips asking the interpreter)
        #[arg(long)]
        site_packages: Option<String>,
    },
}
