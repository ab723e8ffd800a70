// src/commands/mod.rs
//! Command handlers for the cellar CLI

mod bottle;
mod caveats;
mod check;
mod cook;
mod fetch;
mod info;
mod livecheck;
mod taste;

// Re-export all command handlers
pub use bottle::cmd_bottle;
pub use caveats::cmd_caveats;
pub use check::cmd_check;
pub use cook::{cmd_cook, CookArgs};
pub use fetch::cmd_fetch;
pub use info::cmd_info;
pub use livecheck::cmd_livecheck;
pub use taste::cmd_taste;

use anyhow::{Context, Result};
use cellar::recipe::{parse_formula_file, Formula, KitchenConfig};
use std::path::{Path, PathBuf};

/// Options shared by every subcommand
pub struct Globals {
    pub root: PathBuf,
    pub cache: Option<PathBuf>,
}

impl Globals {
    pub fn new(root: &str, cache: Option<&str>) -> Self {
        Self {
            root: PathBuf::from(root),
            cache: cache.map(PathBuf::from),
        }
    }

    /// Kitchen configuration for these options
    pub fn kitchen_config(&self) -> KitchenConfig {
        let mut config = KitchenConfig {
            root: self.root.clone(),
            ..Default::default()
        };
        if let Some(cache) = &self.cache {
            config.source_cache = cache.clone();
        }
        config
    }
}

/// Read and parse a formula file
pub(crate) fn load_formula(path: &str) -> Result<Formula> {
    let path = Path::new(path);
    parse_formula_file(path)
        .with_context(|| format!("Failed to parse formula: {}", path.display()))
}
