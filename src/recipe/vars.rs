// src/recipe/vars.rs

//! `%(name)s` variable interpolation
//!
//! Every string in a formula's install and test sections may reference
//! variables such as `%(prefix)s` or `%(opt.glib)s`. Unlike a plain
//! string replace, an unknown name is an error, so a typo in a formula
//! never reaches a build command.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// A set of variables available for interpolation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variables {
    values: BTreeMap<String, String>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable, replacing any previous value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Set a variable to a path
    pub fn set_path(&mut self, name: impl Into<String>, path: &Path) {
        self.set(name, path.to_string_lossy().into_owned());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Add every variable from `other`, overriding existing names
    pub fn extend(&mut self, other: &Variables) {
        for (k, v) in &other.values {
            self.values.insert(k.clone(), v.clone());
        }
    }

    /// Expand all `%(name)s` references in `template`
    pub fn expand(&self, template: &str) -> Result<String> {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("%(") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];

            let Some(end) = after.find(")s") else {
                return Err(Error::ParseError(format!(
                    "Unterminated variable reference in '{}'",
                    template
                )));
            };

            let name = &after[..end];
            let value = self.get(name).ok_or_else(|| Error::MissingVariable {
                name: name.to_string(),
                template: template.to_string(),
            })?;
            out.push_str(value);
            rest = &after[end + 2..];
        }

        out.push_str(rest);
        Ok(out)
    }

    /// Expand every template in a list
    pub fn expand_all(&self, templates: &[String]) -> Result<Vec<String>> {
        templates.iter().map(|t| self.expand(t)).collect()
    }

    /// Expand the values of an environment map
    pub fn expand_env(&self, env: &BTreeMap<String, String>) -> Result<BTreeMap<String, String>> {
        env.iter()
            .map(|(k, v)| Ok((k.clone(), self.expand(v)?)))
            .collect()
    }
}
