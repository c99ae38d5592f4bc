//! Built-in preset catalog
//!
//! Presets share the registry's entry shape and are embedded as JSON.

use anyhow::{Context, Result};

use crate::config::ThemeEntry;
use crate::error::NyoomError;

const CATALOG: &str = include_str!("../presets/presets.json");

pub fn all() -> Result<Vec<ThemeEntry>> {
    serde_json::from_str(CATALOG).context("Failed to parse embedded preset catalog")
}

pub fn find(name: &str) -> Result<ThemeEntry> {
    all()?
        .into_iter()
        .find(|p| p.name == name)
        .ok_or_else(|| NyoomError::PresetNotFound(name.to_string()).into())
}
