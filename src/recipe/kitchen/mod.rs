// src/recipe/kitchen/mod.rs

//! Kitchen: where formulas are cooked into kegs
//!
//! The Kitchen handles:
//! - Locating declared dependencies
//! - Fetching and verifying source archives and resources
//! - Running the ordered install steps into the keg prefix
//! - Tasting the result with the formula's smoke test

mod archive;
mod config;
mod cook;
pub mod deps;
pub mod inreplace;
pub mod runner;
pub mod taste;

pub use archive::fetch_text;
pub use config::{CookOptions, CookResult, KitchenConfig, DEFAULT_PYTHON, DEFAULT_ROOT};
use cook::Cook;
pub use deps::{DependencyResolver, LocatedDeps, NoopResolver, OptResolver};
pub use runner::{CommandOutput, CommandRunner, CommandSpec, SystemRunner};
pub use taste::{TasteContext, TasteReport};

use crate::error::{Error, Result};
use crate::platform::Platform;
use crate::recipe::format::Formula;
use crate::recipe::paths::InstallPaths;
use crate::recipe::python;
use archive::{download_file, verify_file_checksum};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The Kitchen: where formulas are cooked
pub struct Kitchen {
    pub(crate) config: KitchenConfig,
    runner: Arc<dyn CommandRunner>,
    /// Dependency locator; defaults to [`OptResolver`] over the root
    resolver: Option<Arc<dyn DependencyResolver>>,
}

impl Kitchen {
    /// Create a new Kitchen that runs real processes
    pub fn new(config: KitchenConfig) -> Self {
        Self::with_runner(config, Arc::new(SystemRunner))
    }

    /// Create a new Kitchen with a custom command runner
    pub fn with_runner(config: KitchenConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            config,
            runner,
            resolver: None,
        }
    }

    /// Create a Kitchen with default configuration
    pub fn with_defaults() -> Self {
        Self::new(KitchenConfig::default())
    }

    /// Set the dependency resolver
    pub fn set_resolver(&mut self, resolver: Arc<dyn DependencyResolver>) {
        self.resolver = Some(resolver);
    }

    pub fn config(&self) -> &KitchenConfig {
        &self.config
    }

    pub fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }

    /// Keg layout for a formula under this kitchen's root
    pub fn paths_for(&self, formula: &Formula, head: bool) -> InstallPaths {
        if head {
            InstallPaths::for_head(&self.config.root, formula)
        } else {
            InstallPaths::new(&self.config.root, formula)
        }
    }

    /// Locate every dependency `formula` needs on `platform`
    ///
    /// Never fails on missing dependencies; they are listed in the result.
    pub fn locate_dependencies(&self, formula: &Formula, platform: &Platform) -> Result<LocatedDeps> {
        let deps = formula.deps_for(platform)?;
        let mut result = LocatedDeps::default();

        if deps.is_empty() {
            debug!("No dependencies declared for {}", platform);
            return Ok(result);
        }

        let default_resolver;
        let resolver: &dyn DependencyResolver = match &self.resolver {
            Some(r) => r.as_ref(),
            None => {
                default_resolver = OptResolver::new(&self.config.root);
                &default_resolver
            }
        };

        for dep in deps {
            match resolver.locate(dep)? {
                Some(prefix) => {
                    debug!("Found {} at {}", dep.name, prefix.display());
                    result.found.insert(dep.name.clone(), prefix);
                }
                None => result.missing.push(dep.name.clone()),
            }
        }

        if !result.missing.is_empty() {
            warn!("Missing dependencies: {}", result.missing.join(", "));
        }

        Ok(result)
    }

    /// Cook a formula into its keg
    ///
    /// ## Cooking Process
    /// 0. **Dependencies**: locate every declared dependency, resolve build flags
    /// 1. **Prep**: fetch and verify the source archive and resources
    /// 2. **Unpack**: extract sources (or clone the head branch)
    /// 3. **Simmer**: run the install steps in order into a clean keg
    /// 4. **Plate**: write the install receipt and record the keg layout
    ///
    /// Any failure aborts the cook; there are no retries and no partial
    /// success.
    pub fn cook(&self, formula: &Formula, options: &CookOptions) -> Result<CookResult> {
        info!(
            "Cooking {} {}",
            formula.package.name,
            if options.head { "HEAD".to_string() } else { formula.pkg_version() }
        );

        if options.head && formula.head.is_none() {
            return Err(Error::ValidationError(format!(
                "{} has no [head] section",
                formula.package.name
            )));
        }

        // Phase 0: dependencies and platform flags
        let deps = if options.skip_deps {
            info!("Skipping dependency checks");
            let noop = NoopResolver::new(&self.config.root);
            let mut located = LocatedDeps::default();
            for dep in formula.deps_for(&options.platform)? {
                if let Some(prefix) = noop.locate(dep)? {
                    located.found.insert(dep.name.clone(), prefix);
                }
            }
            located
        } else {
            let located = self.locate_dependencies(formula, &options.platform)?;
            if !located.is_complete() {
                return Err(Error::MissingDependency(located.missing));
            }
            located
        };
        let flags = formula.build_flags(&options.platform);

        let mut cook = Cook::new(self, formula, options, &deps, &flags)?;

        info!("Prep: fetching ingredients...");
        cook.prep()?;

        info!("Unpacking sources...");
        cook.unpack()?;

        info!("Simmering: running install steps...");
        cook.simmer()?;

        info!("Plating: writing receipt...");
        cook.plate()
    }

    /// Run the smoke test against the installed keg
    pub fn taste(&self, formula: &Formula, head: bool) -> Result<TasteReport> {
        let paths = self.paths_for(formula, head);
        if !paths.prefix.exists() {
            return Err(Error::NotFound(format!(
                "{} is not installed at {}",
                formula.package.name,
                paths.prefix.display()
            )));
        }

        let site_packages = if formula.tests.iter().any(|t| t.needs_site_packages()) {
            Some(self.site_packages(&paths.prefix)?)
        } else {
            None
        };

        let ctx = TasteContext {
            python: self.config.python.clone(),
            site_packages,
        };

        info!("Tasting {}...", formula.package.name);
        taste::run(formula, &paths, self.runner.as_ref(), &ctx)
    }

    /// Caveats of `formula` interpolated against its keg, if it has any
    pub fn caveats(&self, formula: &Formula, head: bool) -> Result<Option<String>> {
        let Some(caveats) = &formula.caveats else {
            return Ok(None);
        };

        let paths = self.paths_for(formula, head);
        let mut vars = paths.variables();
        vars.set("name", &formula.package.name);
        vars.set("version", &formula.package.version);
        vars.set("python", &self.config.python);
        if caveats.text.contains("%(site_packages)s") {
            let cwd = std::env::temp_dir();
            vars.set("site_packages", self.site_packages(&cwd)?);
        }

        Ok(Some(vars.expand(&caveats.text)?))
    }

    /// Relative site-packages directory of the configured interpreter
    pub fn site_packages(&self, cwd: &Path) -> Result<String> {
        match &self.config.site_packages {
            Some(site) => Ok(site.clone()),
            None => python::query_site_packages(self.runner.as_ref(), &self.config.python, cwd),
        }
    }

    /// Fetch sources for a formula without building
    ///
    /// Downloads and verifies the source archive and every resource,
    /// caching them locally for a later offline cook.
    ///
    /// # Returns
    /// A list of paths to the fetched and cached source files.
    pub fn fetch(&self, formula: &Formula) -> Result<Vec<PathBuf>> {
        info!(
            "Fetching sources for {} {}",
            formula.package.name, formula.package.version
        );

        let mut fetched = Vec::new();

        let url = formula.source_url()?;
        info!("Fetching: {}", url);
        fetched.push(self.fetch_source(&url, &formula.source.checksum)?);

        for resource in &formula.resources {
            info!("Fetching resource {}: {}", resource.name, resource.url);
            fetched.push(self.fetch_source(&resource.url, &resource.checksum)?);
        }

        info!(
            "Fetched {} source file(s) for {}",
            fetched.len(),
            formula.package.name
        );

        Ok(fetched)
    }

    fn cache_path(&self, checksum: &str) -> PathBuf {
        self.config.source_cache.join(checksum.replace(':', "_"))
    }

    /// Check if all sources for a formula are already cached
    pub fn sources_cached(&self, formula: &Formula) -> bool {
        std::iter::once(&formula.source.checksum)
            .chain(formula.resources.iter().map(|r| &r.checksum))
            .all(|checksum| self.cache_path(checksum).exists())
    }

    /// Fetch a source archive (with caching)
    ///
    /// The archive is verified before it is moved into the cache; a file
    /// that fails verification is deleted.
    pub fn fetch_source(&self, url: &str, checksum: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.config.source_cache)?;

        let cached_path = self.cache_path(checksum);

        if cached_path.exists() {
            debug!("Using cached source: {}", cached_path.display());
            match verify_file_checksum(&cached_path, checksum) {
                Ok(()) => return Ok(cached_path),
                Err(Error::ChecksumMismatch { .. }) => {
                    warn!("Cached file checksum mismatch, re-downloading");
                    fs::remove_file(&cached_path)?;
                }
                Err(e) => return Err(e),
            }
        }

        info!("Downloading: {}", url);
        let temp_path = cached_path.with_extension("tmp");

        if let Err(e) = download_file(url, &temp_path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }

        if let Err(e) = verify_file_checksum(&temp_path, checksum) {
            fs::remove_file(&temp_path)?;
            return Err(e);
        }

        fs::rename(&temp_path, &cached_path)?;
        Ok(cached_path)
    }
}
