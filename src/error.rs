// src/error.rs

//! Error types for formula parsing, cooking and tasting

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised anywhere between reading a formula and tasting the keg
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid formula: {0}")]
    ValidationError(String),

    #[error("Invalid checksum '{value}': {reason}")]
    InvalidChecksum { value: String, reason: String },

    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("Download failed: {0}")]
    DownloadError(String),

    #[error("Unknown variable %({name})s in '{template}'")]
    MissingVariable { name: String, template: String },

    #[error("Missing dependencies: {}", .0.join(", "))]
    MissingDependency(Vec<String>),

    #[error("Install step {step} ({kind}) failed with {status}\nstderr: {stderr}")]
    BuildFailed {
        step: usize,
        kind: String,
        status: String,
        stderr: String,
    },

    #[error("Test {index} failed: {reason}")]
    TestFailed { index: usize, reason: String },

    #[error("inreplace failed in {}: {reason}", path.display())]
    InreplaceFailed { path: PathBuf, reason: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Command failed: {0}")]
    CommandFailed(String),
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;
