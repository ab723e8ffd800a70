// src/lib.rs

//! Cellar formula kitchen
//!
//! Declarative formulas that describe how a package is fetched, built,
//! installed and verified, plus the kitchen that carries them out.
//!
//! # Architecture
//!
//! - Formulas: TOML recipe cards with pinned sources, resources and bottles
//! - Kegs: one versioned prefix per formula under `<root>/Cellar`
//! - Receipts: JSON record of how each keg was built
//! - Platforms: bottle tags and macOS-provided dependencies

mod error;
pub mod hash;
pub mod platform;
pub mod recipe;

pub use error::{Error, Result};
pub use hash::Checksum;
pub use platform::{Arch, MacOsRelease, OsFamily, Platform};
pub use recipe::{
    parse_formula, parse_formula_file, validate_formula, CookOptions, CookResult, Formula,
    InstallPaths, Kitchen, KitchenConfig,
};
