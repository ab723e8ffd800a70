// src/recipe/steps.rs

//! Install and test step definitions
//!
//! Steps are declared in order in the formula as `[[install]]` and
//! `[[test]]` tables and executed in exactly that order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One step of the install procedure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum InstallStep {
    /// Run `./configure` in the source root
    Configure {
        #[serde(default)]
        args: Vec<String>,
    },

    /// Run `make`
    Make {
        #[serde(default)]
        args: Vec<String>,
    },

    /// Copy files matching glob patterns into a keg directory
    ///
    /// Patterns are relative to the source root. Matched directories are
    /// copied recursively, keeping their own name.
    InstallFiles {
        files: Vec<String>,
        into: String,
        #[serde(default)]
        rename: Option<String>,
    },

    /// Install a python binding into the keg's shared site directory
    PythonInstall {
        /// Source subdirectory holding `setup.py`
        dir: String,
    },

    /// Create an isolated python environment and install into it
    Virtualenv {
        into: String,
        /// Names of `[[resource]]` entries to install first, in order
        #[serde(default)]
        resources: Vec<String>,
        /// Source-relative package directories installed after resources
        #[serde(default)]
        packages: Vec<String>,
    },

    /// Replace a literal string in an installed file
    Inreplace {
        file: String,
        from: String,
        to: String,
        /// Why the file needs patching; logged when the step runs
        #[serde(default)]
        reason: Option<String>,
    },

    /// Append a directory to a path-list environment variable for the
    /// remaining steps
    EnvPath { var: String, path: String },
}

impl InstallStep {
    /// Short name used in logs and errors
    pub fn kind(&self) -> &'static str {
        match self {
            InstallStep::Configure { .. } => "configure",
            InstallStep::Make { .. } => "make",
            InstallStep::InstallFiles { .. } => "install_files",
            InstallStep::PythonInstall { .. } => "python_install",
            InstallStep::Virtualenv { .. } => "virtualenv",
            InstallStep::Inreplace { .. } => "inreplace",
            InstallStep::EnvPath { .. } => "env_path",
        }
    }

    /// Every interpolated string of this step
    pub fn templates(&self) -> Vec<&str> {
        match self {
            InstallStep::Configure { args } | InstallStep::Make { args } => {
                args.iter().map(String::as_str).collect()
            }
            InstallStep::InstallFiles { files, into, rename } => files
                .iter()
                .chain(std::iter::once(into))
                .chain(rename.iter())
                .map(String::as_str)
                .collect(),
            InstallStep::PythonInstall { dir } => vec![dir.as_str()],
            InstallStep::Virtualenv { into, packages, .. } => std::iter::once(into)
                .chain(packages.iter())
                .map(String::as_str)
                .collect(),
            InstallStep::Inreplace { file, from, to, .. } => {
                vec![file.as_str(), from.as_str(), to.as_str()]
            }
            InstallStep::EnvPath { path, .. } => vec![path.as_str()],
        }
    }

    /// Whether running this step needs the interpreter's site directory
    pub fn needs_site_packages(&self) -> bool {
        matches!(
            self,
            InstallStep::PythonInstall { .. } | InstallStep::Virtualenv { .. }
        ) || self
            .templates()
            .iter()
            .any(|t| t.contains("%(site_packages)s"))
    }
}

impl fmt::Display for InstallStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallStep::Configure { args } => write!(f, "./configure {}", args.join(" ")),
            InstallStep::Make { args } => write!(f, "make {}", args.join(" ")),
            InstallStep::InstallFiles { files, into, .. } => {
                write!(f, "install {} -> {}", files.join(" "), into)
            }
            InstallStep::PythonInstall { dir } => write!(f, "python install from {}", dir),
            InstallStep::Virtualenv { into, .. } => write!(f, "virtualenv at {}", into),
            InstallStep::Inreplace { file, .. } => write!(f, "inreplace {}", file),
            InstallStep::EnvPath { var, path } => write!(f, "{} += {}", var, path),
        }
    }
}

/// One assertion of the smoke test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum TestStep {
    /// Write a file relative to the test directory
    WriteFile { path: String, contents: String },

    /// Create a directory relative to the test directory
    Mkdir { path: String },

    /// Run a command; it must succeed and its stdout must contain `expect`
    OutputContains {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        expect: String,
        #[serde(default)]
        env: BTreeMap<String, String>,
    },

    /// Run a command; it must exit successfully
    Succeeds {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        env: BTreeMap<String, String>,
    },
}

impl TestStep {
    pub fn kind(&self) -> &'static str {
        match self {
            TestStep::WriteFile { .. } => "write_file",
            TestStep::Mkdir { .. } => "mkdir",
            TestStep::OutputContains { .. } => "output_contains",
            TestStep::Succeeds { .. } => "succeeds",
        }
    }

    /// Every interpolated string of this check, environment values included
    pub fn templates(&self) -> Vec<&str> {
        match self {
            TestStep::WriteFile { path, contents } => vec![path.as_str(), contents.as_str()],
            TestStep::Mkdir { path } => vec![path.as_str()],
            TestStep::OutputContains {
                command, args, env, ..
            }
            | TestStep::Succeeds { command, args, env } => std::iter::once(command)
                .chain(args.iter())
                .chain(env.values())
                .map(String::as_str)
                .collect(),
        }
    }

    pub fn needs_site_packages(&self) -> bool {
        self.templates()
            .iter()
            .any(|t| t.contains("%(site_packages)s"))
    }
}
