// src/recipe/parser.rs

//! Formula file parsing and validation

use crate::error::{Error, Result};
use crate::hash::Checksum;
use crate::platform::{MacOsRelease, Platform};
use crate::recipe::format::Formula;
use crate::recipe::steps::InstallStep;
use std::collections::HashSet;
use std::path::Path;

/// Parse a formula from a TOML string
pub fn parse_formula(content: &str) -> Result<Formula> {
    toml::from_str(content).map_err(|e| Error::ParseError(format!("Invalid formula: {}", e)))
}

/// Parse a formula from a file
pub fn parse_formula_file(path: &Path) -> Result<Formula> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::IoError(format!(
            "Failed to read formula file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_formula(&content)
}

/// Validate a formula for completeness and correctness
///
/// Hard errors are returned as `Err`; softer issues come back as warnings.
pub fn validate_formula(formula: &Formula) -> Result<Vec<String>> {
    let mut warnings = Vec::new();

    if formula.package.name.is_empty() {
        return Err(Error::ValidationError("package name cannot be empty".to_string()));
    }
    if formula.package.version.is_empty() {
        return Err(Error::ValidationError("package version cannot be empty".to_string()));
    }

    formula.source_url()?;
    Checksum::parse_prefixed(&formula.source.checksum)?;

    validate_bottles(formula)?;
    validate_dependencies(formula)?;
    validate_resources(formula)?;
    validate_steps(formula)?;

    if let Some(livecheck) = &formula.livecheck {
        regex::Regex::new(&livecheck.regex).map_err(|e| {
            Error::ValidationError(format!("livecheck regex does not compile: {}", e))
        })?;
    }

    if formula.package.description.is_none() {
        warnings.push("Missing package description".to_string());
    }
    if formula.package.license.is_none() {
        warnings.push("Missing package license".to_string());
    }
    if formula.install.is_empty() {
        warnings.push("No install steps specified".to_string());
    }
    if formula.tests.is_empty() {
        warnings.push("No test steps specified".to_string());
    }
    if formula.bottles.is_empty() {
        warnings.push("No bottles published; every install cooks from source".to_string());
    }

    Ok(warnings)
}

fn validate_bottles(formula: &Formula) -> Result<()> {
    let mut seen = HashSet::new();
    for bottle in &formula.bottles {
        if !seen.insert(bottle.tag.as_str()) {
            return Err(Error::ValidationError(format!(
                "duplicate bottle tag '{}'",
                bottle.tag
            )));
        }
        Platform::from_bottle_tag(&bottle.tag).map_err(|_| {
            Error::ValidationError(format!("unknown bottle tag '{}'", bottle.tag))
        })?;
        if bottle.sha256.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(Error::ValidationError(format!(
                "bottle '{}' sha256 must be lowercase hex",
                bottle.tag
            )));
        }
        Checksum::from_hex(&bottle.sha256)?;
    }
    Ok(())
}

fn validate_dependencies(formula: &Formula) -> Result<()> {
    let mut seen = HashSet::new();
    for dep in &formula.dependencies {
        if !seen.insert(dep.name.as_str()) {
            return Err(Error::ValidationError(format!(
                "dependency '{}' declared twice",
                dep.name
            )));
        }
        if let Some(since) = &dep.since {
            if !dep.uses_from_macos {
                return Err(Error::ValidationError(format!(
                    "dependency '{}' sets 'since' without 'uses_from_macos'",
                    dep.name
                )));
            }
            since.parse::<MacOsRelease>()?;
        }
    }
    Ok(())
}

fn validate_resources(formula: &Formula) -> Result<()> {
    let mut seen = HashSet::new();
    for resource in &formula.resources {
        if !seen.insert(resource.name.as_str()) {
            return Err(Error::ValidationError(format!(
                "resource '{}' declared twice",
                resource.name
            )));
        }
        Checksum::parse_prefixed(&resource.checksum)?;
    }
    Ok(())
}

fn validate_steps(formula: &Formula) -> Result<()> {
    for (index, step) in formula.install.iter().enumerate() {
        match step {
            InstallStep::Virtualenv { resources, .. } => {
                for name in resources {
                    formula.resource(name).map_err(|_| {
                        Error::ValidationError(format!(
                            "install step {} references unknown resource '{}'",
                            index + 1,
                            name
                        ))
                    })?;
                }
            }
            InstallStep::InstallFiles { files, rename, .. } => {
                if files.is_empty() {
                    return Err(Error::ValidationError(format!(
                        "install step {} has no files",
                        index + 1
                    )));
                }
                if rename.is_some() && files.len() != 1 {
                    return Err(Error::ValidationError(format!(
                        "install step {} renames more than one pattern",
                        index + 1
                    )));
                }
            }
            InstallStep::Inreplace { from, .. } if from.is_empty() => {
                return Err(Error::ValidationError(format!(
                    "install step {} replaces an empty string",
                    index + 1
                )));
            }
            _ => {}
        }
    }
    Ok(())
}
