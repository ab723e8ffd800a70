// src/recipe/kitchen/config.rs

//! Configuration types for the Kitchen

use crate::platform::Platform;
use crate::recipe::layout::LayoutSnapshot;
use crate::recipe::python::BindingTarget;
use std::path::{Path, PathBuf};

/// Default root for kegs and opt links
pub const DEFAULT_ROOT: &str = "/opt/cellar";

/// Default python interpreter
pub const DEFAULT_PYTHON: &str = "python3";

/// Configuration for the Kitchen
#[derive(Debug, Clone)]
pub struct KitchenConfig {
    /// Directory for downloaded sources
    pub source_cache: PathBuf,
    /// Root holding `Cellar/` and `opt/`
    pub root: PathBuf,
    /// Number of parallel jobs
    pub jobs: u32,
    /// Keep build directory after completion (for debugging)
    pub keep_builddir: bool,
    /// Python interpreter used by binding steps and the smoke test
    pub python: String,
    /// Relative site-packages directory; queried from `python` if unset
    pub site_packages: Option<String>,
}

impl Default for KitchenConfig {
    fn default() -> Self {
        let jobs = std::thread::available_parallelism()
            .map(|p| p.get() as u32)
            .unwrap_or(4);

        let source_cache = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("cellar/sources");

        Self {
            source_cache,
            root: PathBuf::from(DEFAULT_ROOT),
            jobs,
            keep_builddir: false,
            python: DEFAULT_PYTHON.to_string(),
            site_packages: None,
        }
    }
}

impl KitchenConfig {
    /// Configuration rooted at `root`, with the source cache inside it
    ///
    /// Useful for self-contained trees (tests, scratch installs).
    pub fn with_root(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            source_cache: root.join("cache/sources"),
            ..Self::default()
        }
    }
}

/// Options for a single cook
#[derive(Debug, Clone)]
pub struct CookOptions {
    /// Build from the `[head]` branch instead of the release archive
    pub head: bool,
    /// Platform to cook for
    pub platform: Platform,
    /// Skip dependency location
    pub skip_deps: bool,
}

impl CookOptions {
    pub fn for_platform(platform: Platform) -> Self {
        Self {
            head: false,
            platform,
            skip_deps: false,
        }
    }
}

/// Result of cooking a formula
#[derive(Debug)]
pub struct CookResult {
    /// Keg prefix the formula was installed into
    pub prefix: PathBuf,
    /// Stable `opt/<name>` link now pointing at `prefix`
    pub opt_prefix: PathBuf,
    /// Installed version (`0.36_1`, or `HEAD`)
    pub pkg_version: String,
    /// Build log
    pub log: String,
    /// Warnings generated during build
    pub warnings: Vec<String>,
    /// Path of the written install receipt
    pub receipt_path: PathBuf,
    /// Final keg contents
    pub layout: LayoutSnapshot,
    /// Binding targets installed by python steps, in step order
    pub bindings: Vec<BindingTarget>,
    /// Whether this was a head build
    pub from_head: bool,
    /// Interpolated caveats, if the formula has any
    pub caveats: Option<String>,
    /// Build directory, if it was kept
    pub build_dir: Option<PathBuf>,
}
