// src/recipe/kitchen/taste.rs

//! Taste: run a formula's smoke test against an installed keg
//!
//! Every check runs in a fresh scratch directory that also serves as
//! `HOME`, so tools that read per-user configuration (like notmuch's
//! `~/.notmuch-config`) see only what the test wrote.

use crate::error::{Error, Result};
use crate::recipe::format::Formula;
use crate::recipe::paths::InstallPaths;
use crate::recipe::steps::TestStep;
use crate::recipe::vars::Variables;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

use super::runner::{CommandOutput, CommandRunner, CommandSpec};

/// Interpreter settings the test can reference
#[derive(Debug, Clone)]
pub struct TasteContext {
    pub python: String,
    pub site_packages: Option<String>,
}

/// Outcome of a passing smoke test
#[derive(Debug, Clone, Default)]
pub struct TasteReport {
    /// One line per passed check, in order
    pub passed: Vec<String>,
}

impl TasteReport {
    pub fn len(&self) -> usize {
        self.passed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passed.is_empty()
    }
}

/// Run every `[[test]]` check in order; the first failure aborts
pub fn run(
    formula: &Formula,
    paths: &InstallPaths,
    runner: &dyn CommandRunner,
    ctx: &TasteContext,
) -> Result<TasteReport> {
    let testdir = TempDir::new()
        .map_err(|e| Error::IoError(format!("Failed to create test directory: {}", e)))?;
    run_in(formula, paths, runner, ctx, testdir.path())
}

/// Like [`run`], but in a caller-provided test directory
pub fn run_in(
    formula: &Formula,
    paths: &InstallPaths,
    runner: &dyn CommandRunner,
    ctx: &TasteContext,
    testpath: &Path,
) -> Result<TasteReport> {
    let mut vars = paths.variables();
    vars.set("name", &formula.package.name);
    vars.set("version", &formula.package.version);
    vars.set_path("testpath", testpath);
    vars.set("python", &ctx.python);
    if let Some(site) = &ctx.site_packages {
        vars.set("site_packages", site);
    }

    let mut report = TasteReport::default();
    let total = formula.tests.len();

    for (i, check) in formula.tests.iter().enumerate() {
        let index = i + 1;
        debug!("Check {}/{}: {}", index, total, check.kind());
        let line = run_check(index, check, &vars, runner, testpath)?;
        info!("ok {} - {}", index, line);
        report.passed.push(line);
    }

    Ok(report)
}

fn run_check(
    index: usize,
    check: &TestStep,
    vars: &Variables,
    runner: &dyn CommandRunner,
    testpath: &Path,
) -> Result<String> {
    match check {
        TestStep::WriteFile { path, contents } => {
            let target = within(testpath, &vars.expand(path)?);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, vars.expand(contents)?)?;
            Ok(format!("wrote {}", target.display()))
        }

        TestStep::Mkdir { path } => {
            let target = within(testpath, &vars.expand(path)?);
            fs::create_dir_all(&target)?;
            Ok(format!("created {}", target.display()))
        }

        TestStep::OutputContains {
            command,
            args,
            expect,
            env,
        } => {
            let (spec, output) = run_command(index, command, args, env, vars, runner, testpath)?;
            if !output.stdout.contains(expect.as_str()) {
                return Err(Error::TestFailed {
                    index,
                    reason: format!(
                        "output of `{}` does not contain '{}':\n{}",
                        spec,
                        expect,
                        output.stdout.trim_end()
                    ),
                });
            }
            Ok(format!("`{}` printed '{}'", spec, expect))
        }

        TestStep::Succeeds { command, args, env } => {
            let (spec, _) = run_command(index, command, args, env, vars, runner, testpath)?;
            Ok(format!("`{}` succeeded", spec))
        }
    }
}

fn run_command(
    index: usize,
    command: &str,
    args: &[String],
    env: &BTreeMap<String, String>,
    vars: &Variables,
    runner: &dyn CommandRunner,
    testpath: &Path,
) -> Result<(CommandSpec, CommandOutput)> {
    let mut spec = CommandSpec::new(vars.expand(command)?, testpath)
        .args(vars.expand_all(args)?)
        .envs(&vars.expand_env(env)?);
    // Module search paths come from the check alone, never from the host
    if !spec.env.contains_key("PYTHONPATH") {
        spec = spec.env_remove("PYTHONPATH");
    }
    spec.env
        .insert("HOME".to_string(), testpath.to_string_lossy().into_owned());

    let output = runner.run(&spec)?;
    if !output.success() {
        return Err(Error::TestFailed {
            index,
            reason: format!(
                "`{}` failed with {}: {}",
                spec,
                output.status(),
                output.stderr.trim()
            ),
        });
    }
    Ok((spec, output))
}

/// Resolve a test-relative path
fn within(testpath: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        testpath.join(path)
    }
}
