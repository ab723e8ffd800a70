// src/recipe/kitchen/inreplace.rs

//! In-place literal replacement in installed files

use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

/// Replace every occurrence of `from` with `to` in `path`
///
/// Returns the number of replacements. Finding nothing to replace is an
/// error: the file changed upstream and the patch needs attention.
pub fn inreplace(path: &Path, from: &str, to: &str) -> Result<usize> {
    let content = fs::read_to_string(path).map_err(|e| Error::InreplaceFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let count = content.matches(from).count();
    if count == 0 {
        return Err(Error::InreplaceFailed {
            path: path.to_path_buf(),
            reason: format!("'{}' not found", from),
        });
    }

    fs::write(path, content.replace(from, to))?;
    Ok(count)
}
