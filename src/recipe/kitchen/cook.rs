// src/recipe/kitchen/cook.rs

//! Cook: the actual build execution for a single formula

use crate::error::{Error, Result};
use crate::recipe::format::{BuildFlags, Formula};
use crate::recipe::layout::LayoutSnapshot;
use crate::recipe::paths::InstallPaths;
use crate::recipe::python::{self, BindingTarget};
use crate::recipe::receipt::{BuiltFrom, InstallReceipt};
use crate::recipe::steps::InstallStep;
use crate::recipe::vars::Variables;
use chrono::Utc;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};
use walkdir::WalkDir;

use super::archive::{extract_archive, source_root};
use super::config::{CookOptions, CookResult};
use super::deps::LocatedDeps;
use super::inreplace::inreplace;
use super::runner::{CommandOutput, CommandSpec};
use super::Kitchen;

/// A single cook operation
pub struct Cook<'a> {
    pub(super) kitchen: &'a Kitchen,
    pub(super) formula: &'a Formula,
    pub(super) options: &'a CookOptions,
    pub(super) paths: InstallPaths,
    /// Temporary build directory
    pub(super) build_dir: TempDir,
    /// Source directory within build_dir
    pub(super) source_dir: PathBuf,
    /// Cached archive of the main source (release builds)
    archive: Option<PathBuf>,
    /// Cached resource archives by name
    resources: BTreeMap<String, PathBuf>,
    /// Environment every step runs with
    env: BTreeMap<String, String>,
    vars: Variables,
    bindings: Vec<BindingTarget>,
    /// Build log accumulator
    pub(super) log: String,
    /// Warnings
    pub(super) warnings: Vec<String>,
}

impl<'a> Cook<'a> {
    pub(super) fn new(
        kitchen: &'a Kitchen,
        formula: &'a Formula,
        options: &'a CookOptions,
        deps: &LocatedDeps,
        flags: &BuildFlags,
    ) -> Result<Self> {
        let build_dir = TempDir::new()
            .map_err(|e| Error::IoError(format!("Failed to create build directory: {}", e)))?;
        let source_dir = build_dir.path().join("source");

        let paths = kitchen.paths_for(formula, options.head);
        let jobs = kitchen.config.jobs;

        let mut env = flags.to_env();
        env.insert("MAKEFLAGS".to_string(), format!("-j{}", jobs));

        let mut vars = paths.variables();
        vars.set("name", &formula.package.name);
        vars.set(
            "version",
            if options.head { "HEAD" } else { formula.package.version.as_str() },
        );
        vars.set("jobs", jobs.to_string());
        vars.set("python", &kitchen.config.python);
        for (name, prefix) in &deps.found {
            vars.set_path(format!("opt.{}", name), prefix);
        }

        Ok(Self {
            kitchen,
            formula,
            options,
            paths,
            build_dir,
            source_dir,
            archive: None,
            resources: BTreeMap::new(),
            env,
            vars,
            bindings: Vec::new(),
            log: String::new(),
            warnings: Vec::new(),
        })
    }

    /// Phase 1: Prep - fetch and verify the source and every resource
    pub(super) fn prep(&mut self) -> Result<()> {
        let formula = self.formula;
        if !self.options.head {
            let url = formula.source_url()?;
            let path = self.kitchen.fetch_source(&url, &formula.source.checksum)?;
            self.log_line(&format!("Fetched source: {}", url));
            self.archive = Some(path);
        }

        for resource in &formula.resources {
            let cached = self.kitchen.fetch_source(&resource.url, &resource.checksum)?;
            // pip infers the archive type from the filename
            let dir = self.build_dir.path().join("resources");
            fs::create_dir_all(&dir)?;
            let local = dir.join(resource.filename());
            fs::copy(&cached, &local)?;
            self.resources.insert(resource.name.clone(), local);
            self.log_line(&format!("Fetched resource {}: {}", resource.name, resource.url));
        }

        Ok(())
    }

    /// Phase 2: Unpack sources (or clone the head branch)
    pub(super) fn unpack(&mut self) -> Result<()> {
        let formula = self.formula;
        match self.archive.clone() {
            Some(cached) => {
                // Extraction dispatches on the filename, the cache key has none
                let local = self.build_dir.path().join(formula.archive_filename()?);
                fs::copy(&cached, &local)?;
                extract_archive(&local, &self.source_dir)?;
                self.source_dir = source_root(&self.source_dir)?;
            }
            None => {
                let head = formula.head.as_ref().ok_or_else(|| {
                    Error::ValidationError(format!(
                        "{} has no [head] section",
                        formula.package.name
                    ))
                })?;
                info!("Cloning {} ({})", head.url, head.branch);
                let spec = CommandSpec::new("git", self.build_dir.path()).args([
                    "clone",
                    "--depth",
                    "1",
                    "--branch",
                    head.branch.as_str(),
                    head.url.as_str(),
                    "source",
                ]);
                let output = self.kitchen.runner.run(&spec)?;
                self.log_build_output("git clone", &output);
                if !output.success() {
                    return Err(Error::DownloadError(format!(
                        "git clone of {} failed with {}: {}",
                        head.url,
                        output.status(),
                        output.stderr.trim()
                    )));
                }
            }
        }

        debug!("Source directory: {}", self.source_dir.display());
        self.log_line(&format!("Source root: {}", self.source_dir.display()));
        self.vars.set_path("buildpath", &self.source_dir);
        Ok(())
    }

    /// Phase 3: Simmer - run every install step in order
    pub(super) fn simmer(&mut self) -> Result<()> {
        let prefix = self.paths.prefix.clone();
        if prefix.exists() {
            info!("Removing existing keg {}", prefix.display());
            fs::remove_dir_all(&prefix)?;
        }
        fs::create_dir_all(&prefix)?;

        let formula = self.formula;
        if formula.install.iter().any(InstallStep::needs_site_packages) {
            let site = self.kitchen.site_packages(&self.source_dir)?;
            self.vars.set("site_packages", site);
        }

        let total = formula.install.len();
        for (i, step) in formula.install.iter().enumerate() {
            let index = i + 1;
            info!("Step {}/{}: {}", index, total, step.kind());
            self.log_line(&format!("=== step {} ({}) ===", index, step.kind()));
            self.run_step(index, step)?;
        }

        Ok(())
    }

    fn run_step(&mut self, index: usize, step: &InstallStep) -> Result<()> {
        match step {
            InstallStep::Configure { args } => {
                let args = self.vars.expand_all(args)?;
                let configure = self.source_dir.join("configure");
                let spec = CommandSpec::new(configure.to_string_lossy(), &self.source_dir)
                    .args(args)
                    .envs(&self.env);
                self.run_command(index, step, &spec)
            }

            InstallStep::Make { args } => {
                let args = self.vars.expand_all(args)?;
                let spec = CommandSpec::new("make", &self.source_dir)
                    .args(args)
                    .envs(&self.env);
                self.run_command(index, step, &spec)
            }

            InstallStep::InstallFiles { files, into, rename } => {
                let dest = self.keg_path(&self.vars.expand(into)?)?;
                fs::create_dir_all(&dest)?;
                for pattern in files {
                    let pattern = self.vars.expand(pattern)?;
                    let matches = self.glob_source(&pattern)?;
                    if matches.is_empty() {
                        return Err(Error::BuildFailed {
                            step: index,
                            kind: step.kind().to_string(),
                            status: format!("no files matched '{}'", pattern),
                            stderr: String::new(),
                        });
                    }
                    for src in matches {
                        let name = match rename {
                            Some(rename) => self.vars.expand(rename)?,
                            None => file_name(&src)?,
                        };
                        let target = dest.join(name);
                        copy_entry(&src, &target)?;
                        self.log_line(&format!("Installed {} -> {}", src.display(), target.display()));
                    }
                }
                Ok(())
            }

            InstallStep::PythonInstall { dir } => {
                let site = self.site_packages()?;
                let cwd = self.source_dir.join(self.vars.expand(dir)?);
                let shared = BindingTarget::shared(&self.paths.prefix, &site);

                // setuptools refuses to install into a directory missing from sys.path
                fs::create_dir_all(shared.site_dir())?;
                let mut env = self.env.clone();
                let site_dir = shared.site_dir().to_string_lossy().into_owned();
                let pythonpath = python::join_path_list(
                    self.inherited("PYTHONPATH").as_deref(),
                    &site_dir,
                );
                env.insert("PYTHONPATH".to_string(), pythonpath);

                let spec = CommandSpec::new(self.kitchen.config.python.as_str(), &cwd)
                    .args(python::setup_install_args(&self.paths.prefix))
                    .envs(&env);
                self.run_command(index, step, &spec)?;
                self.bindings.push(shared);
                Ok(())
            }

            InstallStep::Virtualenv {
                into,
                resources,
                packages,
            } => {
                let site = self.site_packages()?;
                let root = self.keg_path(&self.vars.expand(into)?)?;
                let root_str = root.to_string_lossy().into_owned();

                let venv = CommandSpec::new(self.kitchen.config.python.as_str(), &self.source_dir)
                    .args(["-m", "venv", root_str.as_str()])
                    .envs(&self.env);
                self.run_command(index, step, &venv)?;

                let pip = root.join("bin/pip").to_string_lossy().into_owned();

                if !resources.is_empty() {
                    let mut archives = Vec::new();
                    for name in resources {
                        let path = self.resources.get(name).ok_or_else(|| {
                            Error::NotFound(format!("resource '{}'", name))
                        })?;
                        archives.push(path.to_string_lossy().into_owned());
                    }
                    let spec = CommandSpec::new(pip.as_str(), &self.source_dir)
                        .args(python::pip_install_args(archives))
                        .envs(&self.env);
                    self.run_command(index, step, &spec)?;
                }

                for package in packages {
                    let dir = self.source_dir.join(self.vars.expand(package)?);
                    let spec = CommandSpec::new(pip.as_str(), &self.source_dir)
                        .args(python::pip_install_args([dir.to_string_lossy().into_owned()]))
                        .envs(&self.env);
                    self.run_command(index, step, &spec)?;
                }

                self.bindings.push(BindingTarget::isolated(&root, &site));
                Ok(())
            }

            InstallStep::Inreplace {
                file,
                from,
                to,
                reason,
            } => {
                let path = self.keg_path(&self.vars.expand(file)?)?;
                let from = self.vars.expand(from)?;
                let to = self.vars.expand(to)?;
                if let Some(reason) = reason {
                    info!("Patching {}: {}", path.display(), reason);
                }
                let count = inreplace(&path, &from, &to)?;
                self.log_line(&format!(
                    "Replaced {} occurrence(s) in {}",
                    count,
                    path.display()
                ));
                Ok(())
            }

            InstallStep::EnvPath { var, path } => {
                let path = self.vars.expand(path)?;
                let value = python::join_path_list(self.inherited(var).as_deref(), &path);
                debug!("{}={}", var, value);
                self.env.insert(var.clone(), value);
                Ok(())
            }
        }
    }

    /// Phase 4: Plate - write the receipt and record the keg
    pub(super) fn plate(self) -> Result<CookResult> {
        let built_from = match &self.formula.head {
            Some(head) if self.options.head => BuiltFrom::Head {
                url: head.url.clone(),
                branch: head.branch.clone(),
            },
            _ => BuiltFrom::Source {
                url: self.formula.source_url()?,
                checksum: self.formula.source.checksum.clone(),
            },
        };

        let receipt = InstallReceipt {
            name: self.formula.package.name.clone(),
            pkg_version: self.pkg_version(),
            platform: self.options.platform.bottle_tag(),
            built_from,
            bindings: self.bindings.clone(),
            installed_at: Utc::now(),
        };
        let receipt_path = receipt.write(&self.paths.prefix)?;

        let layout = LayoutSnapshot::capture(&self.paths.prefix)?;
        info!(
            "Cooked: {} ({} entries)",
            self.paths.prefix.display(),
            layout.len()
        );

        link_opt(&self.paths.prefix, &self.paths.opt_prefix)?;
        info!(
            "Linked {} -> {}",
            self.paths.opt_prefix.display(),
            self.paths.prefix.display()
        );

        let caveats = match &self.formula.caveats {
            Some(c) => Some(self.vars.expand(&c.text)?),
            None => None,
        };

        let build_dir = if self.kitchen.config.keep_builddir {
            let kept = self.build_dir.keep();
            info!("Keeping build directory {}", kept.display());
            Some(kept)
        } else {
            None
        };

        Ok(CookResult {
            prefix: self.paths.prefix,
            opt_prefix: self.paths.opt_prefix,
            pkg_version: receipt.pkg_version,
            log: self.log,
            warnings: self.warnings,
            receipt_path,
            layout,
            bindings: self.bindings,
            from_head: self.options.head,
            caveats,
            build_dir,
        })
    }

    fn pkg_version(&self) -> String {
        if self.options.head {
            "HEAD".to_string()
        } else {
            self.formula.pkg_version()
        }
    }

    fn site_packages(&self) -> Result<String> {
        self.vars
            .get("site_packages")
            .map(str::to_string)
            .ok_or_else(|| Error::NotFound("site_packages".to_string()))
    }

    /// Current value of a path-list variable, falling back to the host's
    fn inherited(&self, var: &str) -> Option<String> {
        self.env
            .get(var)
            .cloned()
            .or_else(|| std::env::var(var).ok())
    }

    /// Resolve a step target and require it to lie inside the keg
    fn keg_path(&self, target: &str) -> Result<PathBuf> {
        let path = PathBuf::from(target);
        if !path.is_absolute() || !self.paths.contains(&path) {
            return Err(Error::ValidationError(format!(
                "{} is outside the keg {}",
                target,
                self.paths.prefix.display()
            )));
        }
        Ok(path)
    }

    fn glob_source(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let full = self.source_dir.join(pattern);
        let full = full.to_string_lossy();
        let mut matches = glob::glob(&full)
            .map_err(|e| Error::ParseError(format!("Invalid pattern '{}': {}", pattern, e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::IoError(e.to_string()))?;
        matches.sort();
        Ok(matches)
    }

    fn run_command(&mut self, index: usize, step: &InstallStep, spec: &CommandSpec) -> Result<()> {
        debug!("Command: {}", spec);
        let output = self.kitchen.runner.run(spec)?;
        self.log_build_output(&spec.program, &output);

        if !output.success() {
            return Err(Error::BuildFailed {
                step: index,
                kind: step.kind().to_string(),
                status: output.status(),
                stderr: output.stderr,
            });
        }
        Ok(())
    }

    fn log_line(&mut self, line: &str) {
        self.log.push_str(line);
        self.log.push('\n');
    }

    /// Log command output (stdout/stderr) with a header
    fn log_build_output(&mut self, what: &str, output: &CommandOutput) {
        self.log_line(&format!("--- {} ({}) ---", what, output.status()));
        if !output.stdout.is_empty() {
            self.log.push_str(&output.stdout);
            self.log.push('\n');
        }
        if !output.stderr.is_empty() {
            self.log.push_str(&output.stderr);
            self.log.push('\n');
        }
    }
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| Error::IoError(format!("{} has no file name", path.display())))
}

/// Copy a file, or a directory recursively
fn copy_entry(src: &Path, dest: &Path) -> Result<()> {
    if !src.is_dir() {
        fs::copy(src, dest)?;
        return Ok(());
    }

    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::IoError(e.to_string()))?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| Error::IoError(e.to_string()))?;
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Point `opt` at `keg`, replacing whatever was there
fn link_opt(keg: &Path, opt: &Path) -> Result<()> {
    if let Ok(meta) = fs::symlink_metadata(opt) {
        if meta.is_dir() {
            fs::remove_dir_all(opt)?;
        } else {
            fs::remove_file(opt)?;
        }
    }
    if let Some(parent) = opt.parent() {
        fs::create_dir_all(parent)?;
    }
    std::os::unix::fs::symlink(keg, opt)?;
    Ok(())
}
