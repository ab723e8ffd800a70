// src/recipe/format.rs

//! Formula file format definitions
//!
//! A formula is a TOML file describing one package: where its source
//! lives, which prebuilt bottles exist, what it depends on, and the ordered
//! install and test procedures.

use crate::error::{Error, Result};
use crate::platform::{MacOsRelease, OsFamily, Platform};
use crate::recipe::steps::{InstallStep, TestStep};
use crate::recipe::vars::Variables;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A complete formula
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Formula {
    /// Package metadata
    pub package: PackageSection,

    /// Source archive and its checksum
    pub source: SourceSection,

    /// Development head (optional)
    #[serde(default)]
    pub head: Option<HeadSection>,

    /// Upstream release discovery (optional)
    #[serde(default)]
    pub livecheck: Option<LivecheckSection>,

    /// Prebuilt bottles keyed by platform tag
    #[serde(default, rename = "bottle")]
    pub bottles: Vec<BottleEntry>,

    /// Build-time and run-time requirements
    #[serde(default, rename = "dependency")]
    pub dependencies: Vec<Dependency>,

    /// Pinned secondary archives
    #[serde(default, rename = "resource")]
    pub resources: Vec<Resource>,

    /// Per-platform build configuration
    #[serde(default)]
    pub platform: PlatformSection,

    /// Ordered install procedure
    #[serde(default)]
    pub install: Vec<InstallStep>,

    /// Ordered smoke test
    #[serde(default, rename = "test")]
    pub tests: Vec<TestStep>,

    /// Post-install notes for the user
    #[serde(default)]
    pub caveats: Option<CaveatsSection>,
}

impl Formula {
    /// Version string including the revision suffix (`0.36_1`)
    pub fn pkg_version(&self) -> String {
        if self.package.revision == 0 {
            self.package.version.clone()
        } else {
            format!("{}_{}", self.package.version, self.package.revision)
        }
    }

    /// Variables available in source URLs
    fn metadata_vars(&self) -> Variables {
        let mut vars = Variables::new();
        vars.set("name", &self.package.name);
        vars.set("version", &self.package.version);
        vars
    }

    /// Source URL with `%(version)s` and `%(name)s` expanded
    pub fn source_url(&self) -> Result<String> {
        self.metadata_vars().expand(&self.source.url)
    }

    /// Filename of the source archive
    pub fn archive_filename(&self) -> Result<String> {
        Ok(filename_from_url(&self.source_url()?).to_string())
    }

    /// Bottle entry for a platform, if one was published
    pub fn bottle_for(&self, platform: &Platform) -> Option<&BottleEntry> {
        let tag = platform.bottle_tag();
        self.bottles.iter().find(|b| b.tag == tag)
    }

    /// Look up a resource by name
    pub fn resource(&self, name: &str) -> Result<&Resource> {
        self.resources
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| Error::NotFound(format!("resource '{}'", name)))
    }

    /// Build-only dependencies
    pub fn build_deps(&self) -> Vec<&Dependency> {
        self.dependencies
            .iter()
            .filter(|d| d.kind == DepKind::Build)
            .collect()
    }

    /// Run-time dependencies
    pub fn runtime_deps(&self) -> Vec<&Dependency> {
        self.dependencies
            .iter()
            .filter(|d| d.kind == DepKind::Runtime)
            .collect()
    }

    /// Dependencies that must be present when cooking on `platform`
    pub fn deps_for(&self, platform: &Platform) -> Result<Vec<&Dependency>> {
        let mut deps = Vec::new();
        for dep in &self.dependencies {
            if dep.required_on(platform)? {
                deps.push(dep);
            }
        }
        Ok(deps)
    }

    /// Build configuration for one platform, resolved once per cook
    pub fn build_flags(&self, platform: &Platform) -> BuildFlags {
        let config = match platform.os {
            OsFamily::Linux => self.platform.linux.as_ref(),
            OsFamily::MacOs(_) => self.platform.macos.as_ref(),
        };
        match config {
            Some(c) => BuildFlags {
                cxx_standard: c.cxx_standard.clone(),
                env: c.env.clone(),
            },
            None => BuildFlags::default(),
        }
    }
}

/// Extract the last path segment of a URL
pub fn filename_from_url(url: &str) -> &str {
    url.split('/').next_back().unwrap_or("")
}

/// Package metadata section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSection {
    pub name: String,
    pub version: String,

    /// Rebuild counter for the same upstream version
    #[serde(default)]
    pub revision: u32,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub homepage: Option<String>,

    /// License identifier (SPDX)
    #[serde(default)]
    pub license: Option<String>,
}

/// Source archive section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSection {
    /// Archive URL, supports `%(version)s`
    pub url: String,

    /// Prefixed checksum (`sha256:...`)
    pub checksum: String,
}

/// Version-control head
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadSection {
    pub url: String,
    #[serde(default = "default_branch")]
    pub branch: String,
}

fn default_branch() -> String {
    "master".to_string()
}

/// Where and how to discover new upstream releases
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivecheckSection {
    pub url: String,
    /// Regex whose first capture group is a version
    pub regex: String,
}

/// A prebuilt artifact for one platform
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BottleEntry {
    pub tag: String,
    /// Relocation requirement (`any`, `any_skip_relocation`, or a path)
    #[serde(default = "default_cellar")]
    pub cellar: String,
    pub sha256: String,
}

fn default_cellar() -> String {
    "any".to_string()
}

/// Dependency qualifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepKind {
    /// Needed only while cooking
    Build,
    /// Needed by the installed keg
    #[default]
    Runtime,
}

/// A named requirement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,

    #[serde(default)]
    pub kind: DepKind,

    /// Provided by macOS itself, so only needed on other systems
    #[serde(default)]
    pub uses_from_macos: bool,

    /// First macOS release that ships it (with `uses_from_macos`)
    #[serde(default)]
    pub since: Option<String>,
}

impl Dependency {
    /// Whether this dependency must be present on `platform`
    pub fn required_on(&self, platform: &Platform) -> Result<bool> {
        if !self.uses_from_macos {
            return Ok(true);
        }
        match platform.os {
            OsFamily::Linux => Ok(true),
            OsFamily::MacOs(release) => match &self.since {
                None => Ok(false),
                Some(since) => {
                    let since: MacOsRelease = since.parse()?;
                    Ok(release < since)
                }
            },
        }
    }
}

/// A pinned secondary archive
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Resource {
    pub name: String,
    pub url: String,
    pub checksum: String,
}

impl Resource {
    pub fn filename(&self) -> &str {
        filename_from_url(&self.url)
    }
}

/// Per-platform build configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlatformSection {
    #[serde(default)]
    pub linux: Option<PlatformConfig>,
    #[serde(default)]
    pub macos: Option<PlatformConfig>,
}

/// Build configuration applied on one operating system family
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// C++ language standard passed as `-std=...`
    #[serde(default)]
    pub cxx_standard: Option<String>,

    /// Extra build environment
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// Platform build configuration after resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildFlags {
    pub cxx_standard: Option<String>,
    pub env: BTreeMap<String, String>,
}

impl BuildFlags {
    /// Environment entries these flags contribute to every step
    pub fn to_env(&self) -> BTreeMap<String, String> {
        let mut env = self.env.clone();
        if let Some(std) = &self.cxx_standard {
            let flag = format!("-std={}", std);
            let cxxflags = match env.get("CXXFLAGS") {
                Some(existing) if !existing.is_empty() => format!("{} {}", existing, flag),
                _ => flag,
            };
            env.insert("CXXFLAGS".to_string(), cxxflags);
        }
        env
    }
}

/// Caveats section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaveatsSection {
    /// Message text, supports keg variables
    pub text: String,
}
