//! Theme entries as stored in the registry and the preset catalog

use serde::{Deserialize, Serialize};

use crate::error::NyoomError;

/// One preference to write into the managed block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefDeclaration {
    pub key: String,
    pub value: String,
    /// true: value is a JavaScript literal, false: value is quoted as a string
    #[serde(default)]
    pub raw: bool,
}

impl PrefDeclaration {
    pub fn new(key: impl Into<String>, value: impl Into<String>, raw: bool) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            raw,
        }
    }
}

/// A named userchrome: where to fetch it from plus the prefs it needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeEntry {
    pub name: String,
    /// Older registries wrote this as `clone_url`
    #[serde(alias = "clone_url")]
    pub source: String,
    #[serde(rename = "configs", default, skip_serializing_if = "Vec::is_empty")]
    pub prefs: Vec<PrefDeclaration>,
}

impl ThemeEntry {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            prefs: Vec::new(),
        }
    }

    /// Replace an existing key in place, or append a new one
    pub fn set_pref(&mut self, key: &str, value: &str, raw: bool) {
        match self.prefs.iter_mut().find(|p| p.key == key) {
            Some(existing) => {
                existing.value = value.to_string();
                existing.raw = raw;
            }
            None => self.prefs.push(PrefDeclaration::new(key, value, raw)),
        }
    }

    /// Remove a key. Order of the remaining prefs is not kept (swap-remove).
    pub fn unset_pref(&mut self, key: &str) -> Result<PrefDeclaration, NyoomError> {
        let idx = self
            .prefs
            .iter()
            .position(|p| p.key == key)
            .ok_or_else(|| NyoomError::PrefNotFound {
                name: self.name.clone(),
                key: key.to_string(),
            })?;
        Ok(self.prefs.swap_remove(idx))
    }
}
