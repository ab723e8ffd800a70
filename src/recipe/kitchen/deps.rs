// src/recipe/kitchen/deps.rs

//! Dependency location for formula builds
//!
//! This only checks that declared dependencies are already present. It does
//! not resolve versions or install anything.

use crate::error::Result;
use crate::recipe::format::{DepKind, Dependency};
use crate::recipe::paths::InstallPaths;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Trait for locating dependencies before cooking
///
/// This keeps the Kitchen decoupled from however the host tracks installed
/// packages.
pub trait DependencyResolver: Send + Sync {
    /// Opt prefix of an installed dependency, `None` if it is missing
    fn locate(&self, dep: &Dependency) -> Result<Option<PathBuf>>;
}

/// Looks for `<root>/opt/<name>`, falling back to `PATH` for build tools
pub struct OptResolver {
    root: PathBuf,
}

impl OptResolver {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }
}

impl DependencyResolver for OptResolver {
    fn locate(&self, dep: &Dependency) -> Result<Option<PathBuf>> {
        let opt = InstallPaths::opt_prefix_for(&self.root, &dep.name);
        if opt.exists() {
            return Ok(Some(opt));
        }

        if dep.kind == DepKind::Build
            && let Ok(tool) = which::which(&dep.name)
        {
            debug!("Build tool {} found on PATH at {}", dep.name, tool.display());
            // <prefix>/bin/<tool> -> <prefix>
            let prefix = tool
                .parent()
                .and_then(Path::parent)
                .map(Path::to_path_buf)
                .unwrap_or(tool);
            return Ok(Some(prefix));
        }

        Ok(None)
    }
}

/// A no-op resolver that assumes all dependencies are satisfied
///
/// Use this when dependency checks are skipped entirely (`--skip-deps`).
/// Located prefixes fall back to the conventional opt location.
pub struct NoopResolver {
    root: PathBuf,
}

impl NoopResolver {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }
}

impl DependencyResolver for NoopResolver {
    fn locate(&self, dep: &Dependency) -> Result<Option<PathBuf>> {
        Ok(Some(InstallPaths::opt_prefix_for(&self.root, &dep.name)))
    }
}

/// Result of dependency location
#[derive(Debug, Default, Clone)]
pub struct LocatedDeps {
    /// Opt prefix of each located dependency, by name
    pub found: BTreeMap<String, PathBuf>,
    /// Dependencies that could not be located
    pub missing: Vec<String>,
}

impl LocatedDeps {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}
