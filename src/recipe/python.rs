// src/recipe/python.rs

//! Python binding targets
//!
//! A formula can install language bindings two ways:
//!
//! - **Shared site**: installed under `<prefix>/<site_packages>`, which the
//!   host links into the interpreter's shared site directory. Importable
//!   with no extra configuration.
//! - **Isolated**: installed into a private environment under the keg
//!   (usually `libexec`). Never linked into the shared site directory; a
//!   consumer must put the environment's site directory on `PYTHONPATH`.

use crate::error::{Error, Result};
use crate::recipe::kitchen::runner::{CommandRunner, CommandSpec};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Prints the interpreter-relative site directory (`lib/pythonX.Y/site-packages`)
const SITE_PACKAGES_QUERY: &str =
    "import sys; print('lib/python%d.%d/site-packages' % sys.version_info[:2])";

/// Runs `setup.py` through setuptools, even for distutils-only packages
const SETUPTOOLS_SHIM: &str = "import setuptools, tokenize; __file__ = 'setup.py'; \
    f = getattr(tokenize, 'open', open)(__file__); code = f.read().replace('\\r\\n', '\\n'); \
    f.close(); exec(compile(code, __file__, 'exec'))";

/// Where a binding was installed and how it is found at run time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum BindingTarget {
    SharedSite { site_dir: PathBuf },
    Isolated { root: PathBuf, site_dir: PathBuf },
}

impl BindingTarget {
    pub fn shared(prefix: &Path, site_packages: &str) -> Self {
        BindingTarget::SharedSite {
            site_dir: prefix.join(site_packages),
        }
    }

    pub fn isolated(root: &Path, site_packages: &str) -> Self {
        BindingTarget::Isolated {
            root: root.to_path_buf(),
            site_dir: root.join(site_packages),
        }
    }

    /// Directory the binding's modules were installed into
    pub fn site_dir(&self) -> &Path {
        match self {
            BindingTarget::SharedSite { site_dir } => site_dir,
            BindingTarget::Isolated { site_dir, .. } => site_dir,
        }
    }

    /// Entry a consumer must add to `PYTHONPATH`, if any
    pub fn search_path(&self) -> Option<&Path> {
        match self {
            BindingTarget::SharedSite { .. } => None,
            BindingTarget::Isolated { site_dir, .. } => Some(site_dir),
        }
    }

    pub fn is_isolated(&self) -> bool {
        matches!(self, BindingTarget::Isolated { .. })
    }
}

/// Append `entry` to a path-list value
pub fn join_path_list(existing: Option<&str>, entry: &str) -> String {
    match existing {
        Some(current) if !current.is_empty() => format!("{}:{}", current, entry),
        _ => entry.to_string(),
    }
}

/// Ask the interpreter for its relative site-packages directory
pub fn query_site_packages(runner: &dyn CommandRunner, python: &str, cwd: &Path) -> Result<String> {
    let spec = CommandSpec::new(python, cwd).args(["-c", SITE_PACKAGES_QUERY]);
    let output = runner.run(&spec)?;

    if !output.success() {
        return Err(Error::CommandFailed(format!(
            "{} could not report its site-packages directory ({}): {}",
            python,
            output.status(),
            output.stderr.trim()
        )));
    }

    let site = output.stdout.trim().to_string();
    if site.is_empty() {
        return Err(Error::CommandFailed(format!(
            "{} reported an empty site-packages directory",
            python
        )));
    }

    debug!("{} site-packages: {}", python, site);
    Ok(site)
}

/// Arguments for a setuptools install into `prefix`
pub fn setup_install_args(prefix: &Path) -> Vec<String> {
    vec![
        "-c".to_string(),
        SETUPTOOLS_SHIM.to_string(),
        "--no-user-cfg".to_string(),
        "install".to_string(),
        format!("--prefix={}", prefix.display()),
        format!("--install-scripts={}", prefix.join("bin").display()),
        "--single-version-externally-managed".to_string(),
        "--record=installed.txt".to_string(),
    ]
}

/// Arguments for installing local archives or directories with pip
pub fn pip_install_args<I, S>(targets: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut args: Vec<String> = [
        "install",
        "-v",
        "--no-deps",
        "--no-binary",
        ":all:",
        "--ignore-installed",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    args.extend(targets.into_iter().map(Into::into));
    args
}
