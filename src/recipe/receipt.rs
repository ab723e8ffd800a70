// src/recipe/receipt.rs

//! Install receipt written into every keg

use crate::error::{Error, Result};
use crate::recipe::layout::RECEIPT_FILE;
use crate::recipe::python::BindingTarget;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// How the keg's sources were obtained
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BuiltFrom {
    /// Release archive with its verified checksum
    Source { url: String, checksum: String },
    /// Development branch
    Head { url: String, branch: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallReceipt {
    pub name: String,
    pub pkg_version: String,
    /// Bottle tag of the platform the keg was cooked on
    pub platform: String,
    pub built_from: BuiltFrom,
    #[serde(default)]
    pub bindings: Vec<BindingTarget>,
    pub installed_at: DateTime<Utc>,
}

impl InstallReceipt {
    pub fn path_in(prefix: &Path) -> PathBuf {
        prefix.join(RECEIPT_FILE)
    }

    /// Write the receipt into `prefix`, returning its path
    pub fn write(&self, prefix: &Path) -> Result<PathBuf> {
        let path = Self::path_in(prefix);
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::ParseError(format!("Failed to serialize receipt: {}", e)))?;
        fs::write(&path, json)?;
        Ok(path)
    }

    pub fn read(prefix: &Path) -> Result<Self> {
        let path = Self::path_in(prefix);
        let content = fs::read_to_string(&path).map_err(|e| {
            Error::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| Error::ParseError(format!("Invalid receipt {}: {}", path.display(), e)))
    }
}
