// src/recipe/kitchen/runner.rs

//! Process execution for install and test steps
//!
//! The kitchen never spawns processes directly; it goes through a
//! [`CommandRunner`] so that the ordering and arguments of a cook can be
//! observed without running a real toolchain.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// A fully-resolved command invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Variables set on top of the inherited environment
    pub env: BTreeMap<String, String>,
    /// Inherited variables removed before `env` is applied
    pub unset: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, cwd: &Path) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.to_path_buf(),
            env: BTreeMap::new(),
            unset: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn envs(mut self, env: &BTreeMap<String, String>) -> Self {
        for (k, v) in env {
            self.env.insert(k.clone(), v.clone());
        }
        self
    }

    /// Do not inherit `var` from the host
    pub fn env_remove(mut self, var: impl Into<String>) -> Self {
        self.unset.push(var.into());
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Human-readable exit status
    pub fn status(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {}", code),
            None => "termination by signal".to_string(),
        }
    }
}

/// Runs commands for the kitchen
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion
    ///
    /// A non-zero exit is *not* an error at this level; only failing to
    /// spawn the process is.
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;
}

/// Runs commands as real host processes
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        debug!("Running: {} (in {})", spec, spec.cwd.display());

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args).current_dir(&spec.cwd);
        for var in &spec.unset {
            cmd.env_remove(var);
        }
        let output = cmd
            .envs(&spec.env)
            .output()
            .map_err(|e| Error::CommandFailed(format!("failed to spawn {}: {}", spec.program, e)))?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_builder_and_display() {
        let mut env = BTreeMap::new();
        env.insert("V".to_string(), "1".to_string());
        let spec = CommandSpec::new("make", Path::new("/tmp"))
            .arg("-C")
            .args(["src", "install"])
            .envs(&env);

        assert_eq!(spec.to_string(), "make -C src install");
        assert_eq!(spec.env.get("V").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_output_status() {
        let ok = CommandOutput {
            code: Some(0),
            ..Default::default()
        };
        assert!(ok.success());

        let killed = CommandOutput::default();
        assert!(!killed.success());
        assert_eq!(killed.status(), "termination by signal");
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_captures_output() {
        let spec = CommandSpec::new("sh", Path::new("/"))
            .args(["-c", "echo out; echo err >&2; exit 3"]);
        let output = SystemRunner.run(&spec).unwrap();
        assert_eq!(output.code, Some(3));
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }

    #[cfg(unix)]
    #[test]
    fn test_env_remove_hides_host_variable() {
        let spec = CommandSpec::new("sh", Path::new("/"))
            .args(["-c", "echo ${HOME-gone}"])
            .env_remove("HOME");
        assert_eq!(spec.unset, ["HOME"]);

        let output = SystemRunner.run(&spec).unwrap();
        assert_eq!(output.stdout.trim(), "gone");
    }

    #[test]
    fn test_system_runner_spawn_failure() {
        let spec = CommandSpec::new("/nonexistent/definitely-not-a-binary", Path::new("/"));
        assert!(matches!(SystemRunner.run(&spec), Err(Error::CommandFailed(_))));
    }
}
