use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// Normalize an argument name: ASCII lowercase, `-` becomes `_`.
pub fn normalize_key(name: &str) -> String {
    name.chars()
        .map(|c| if c == '-' { '_' } else { c.to_ascii_lowercase() })
        .collect()
}

/// A name/value argument set with normalized keys.
///
/// Used for the three scope layers of backtick substitution: per-call
/// arguments, block-level argument defaults, and the lexer globals.
/// Iteration runs in sorted key order.
#[derive(Debug, Default, Clone)]
pub struct ArgMap {
    args: BTreeMap<String, String>,
}

impl ArgMap {
    pub fn new() -> ArgMap {
        ArgMap::default()
    }

    pub fn set(&mut self, name: &str, value: &str) {
        self.args.insert(normalize_key(name), value.to_string());
    }

    /// Look up `name`, trying the raw spelling first and the normalized
    /// spelling second.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.args
            .get(name)
            .or_else(|| self.args.get(&normalize_key(name)))
            .map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.args.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Check that every argument is permitted by `defs`. The first
    /// offending pair is reported; with no `defs` every argument is
    /// an error.
    pub fn validate(&self, defs: Option<&ArgMap>, context: &str) -> Result<()> {
        for (key, value) in self.iter() {
            if defs.map_or(true, |d| d.get(key).is_none()) {
                log::error!(
                    "Unknown argument; context='{}', arg='{}', value='{}'",
                    context,
                    key,
                    value
                );
                return Err(Error::UnknownArgument {
                    context: context.to_string(),
                    key: key.to_string(),
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }
}
