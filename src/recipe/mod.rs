// src/recipe/mod.rs

//! Formula system for building packages from source
//!
//! Formulas define how to build and verify a package, including:
//! - The source archive and its checksum
//! - Prebuilt bottles per platform
//! - Build and run-time dependencies
//! - Pinned secondary resources
//! - Ordered install steps and smoke-test checks
//!
//! # Culinary Terminology
//!
//! We use cooking metaphors throughout:
//! - **Formula**: The build description (like a recipe card)
//! - **Kitchen**: Where formulas are cooked
//! - **Cook**: Build and install a formula into its keg
//! - **Prep**: Fetch and verify ingredients (sources and resources)
//! - **Simmer**: Run the install steps
//! - **Plate**: Write the install receipt
//! - **Taste**: Run the smoke test against the keg
//!
//! # Example Formula
//!
//! ```toml
//! [package]
//! name = "hello"
//! version = "2.12"
//! license = "GPL-3.0-or-later"
//!
//! [source]
//! url = "https://ftp.gnu.org/gnu/hello/hello-%(version)s.tar.gz"
//! checksum = "sha256:cf04af86dc085268c5f4470fbae49b18afbc221b78096aab842d934a76bad0ab"
//!
//! [[install]]
//! step = "configure"
//! args = ["--prefix=%(prefix)s"]
//!
//! [[install]]
//! step = "make"
//! args = ["install"]
//!
//! [[test]]
//! check = "output_contains"
//! command = "%(bin)s/hello"
//! expect = "Hello, world!"
//! ```

mod format;
pub mod kitchen;
pub mod layout;
pub mod livecheck;
pub mod parser;
pub mod paths;
pub mod python;
pub mod receipt;
pub mod steps;
pub mod vars;

pub use format::{
    filename_from_url, BottleEntry, BuildFlags, CaveatsSection, DepKind, Dependency, Formula,
    HeadSection, LivecheckSection, PackageSection, PlatformConfig, PlatformSection, Resource,
    SourceSection,
};
pub use kitchen::{CookOptions, CookResult, Kitchen, KitchenConfig};
pub use layout::LayoutSnapshot;
pub use parser::{parse_formula, parse_formula_file, validate_formula};
pub use paths::InstallPaths;
pub use python::BindingTarget;
pub use steps::{InstallStep, TestStep};
pub use vars::Variables;
