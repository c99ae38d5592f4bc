//! Theme registry backed by a TOML file
//!
//! Loaded once per command, passed by reference to whatever needs it and
//! written back whole at the end of a mutating command.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::entry::ThemeEntry;
use crate::error::NyoomError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    /// Active Firefox profile directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<PathBuf>,

    #[serde(rename = "userchromes", default, skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<ThemeEntry>,
}

impl Registry {
    /// Default registry location (`$XDG_CONFIG_HOME/nyoom/nyoom.toml` on Linux)
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(crate::constants::config::APP_DIR);
        path.push(crate::constants::config::FILENAME);
        path
    }

    /// Load the registry, treating a missing file as empty
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "Registry file not found, starting empty");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read registry from {}", path.display()))?;

        let registry: Registry = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse TOML from {}", path.display()))?;

        debug!(path = %path.display(), entries = registry.entries.len(), "Loaded registry");
        Ok(registry)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize registry to TOML")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write registry to {}", path.display()))?;

        info!(path = %path.display(), "Saved registry");
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&ThemeEntry, NyoomError> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| NyoomError::ThemeNotFound(name.to_string()))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut ThemeEntry, NyoomError> {
        self.entries
            .iter_mut()
            .find(|e| e.name == name)
            .ok_or_else(|| NyoomError::ThemeNotFound(name.to_string()))
    }

    /// Add an entry unless its name or source is already registered
    pub fn add(&mut self, entry: ThemeEntry) -> Result<&ThemeEntry, NyoomError> {
        for existing in &self.entries {
            if existing.name == entry.name {
                return Err(NyoomError::NameConflict(entry.name));
            }
            if existing.source == entry.source {
                return Err(NyoomError::SourceConflict {
                    location: entry.source,
                    existing: existing.name.clone(),
                });
            }
        }

        info!(name = %entry.name, source = %entry.source, "Adding userchrome");
        self.entries.push(entry);
        Ok(&self.entries[self.entries.len() - 1])
    }

    pub fn remove(&mut self, name: &str) -> Result<ThemeEntry, NyoomError> {
        let idx = self
            .entries
            .iter()
            .position(|e| e.name == name)
            .ok_or_else(|| NyoomError::ThemeNotFound(name.to_string()))?;

        info!(name = %name, "Removing userchrome");
        Ok(self.entries.remove(idx))
    }

    /// Profile directory, or `NoProfile` when unset
    pub fn profile(&self) -> Result<&Path, NyoomError> {
        self.profile.as_deref().ok_or(NyoomError::NoProfile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::entry::PrefDeclaration;
    use tempfile::TempDir;

    fn sample() -> Registry {
        let mut registry = Registry::default();
        registry.add(ThemeEntry::new("a", "https://example.com/a.git")).unwrap();
        registry.add(ThemeEntry::new("b", "https://example.com/b.git")).unwrap();
        registry
    }

    #[test]
    fn test_add_duplicate_name_conflicts() {
        let mut registry = sample();
        let before = registry.clone();

        let err = registry
            .add(ThemeEntry::new("a", "https://example.com/other.git"))
            .unwrap_err();

        assert!(matches!(err, NyoomError::NameConflict(ref n) if n == "a"));
        assert_eq!(registry, before);
    }

    #[test]
    fn test_add_duplicate_source_conflicts() {
        let mut registry = sample();
        let before = registry.clone();

        let err = registry
            .add(ThemeEntry::new("c", "https://example.com/b.git"))
            .unwrap_err();

        assert!(matches!(err, NyoomError::SourceConflict { ref existing, .. } if existing == "b"));
        assert_eq!(registry, before);
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let mut registry = sample();
        registry.add(ThemeEntry::new("A", "https://example.com/upper.git")).unwrap();

        assert_eq!(registry.get("A").unwrap().source, "https://example.com/upper.git");
        assert_eq!(registry.get("a").unwrap().source, "https://example.com/a.git");
    }

    #[test]
    fn test_remove_and_get_missing() {
        let mut registry = sample();
        let removed = registry.remove("a").unwrap();

        assert_eq!(removed.name, "a");
        assert!(matches!(registry.get("a"), Err(NyoomError::ThemeNotFound(_))));
        assert!(matches!(registry.remove("a"), Err(NyoomError::ThemeNotFound(_))));
        assert_eq!(registry.entries.len(), 1);
    }

    #[test]
    fn test_profile_unset() {
        let registry = Registry::default();
        assert!(matches!(registry.profile(), Err(NyoomError::NoProfile)));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let registry = Registry::load(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(registry, Registry::default());
    }

    #[test]
    fn test_save_and_load_preserves_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("nyoom.toml");

        let mut registry = sample();
        registry.profile = Some(PathBuf::from("/home/user/.mozilla/firefox/abc.default"));
        let entry = registry.get_mut("b").unwrap();
        entry.set_pref("svg.context-properties.content.enabled", "true", true);
        entry.set_pref("browser.uidensity", "compact", false);

        registry.save(&path).unwrap();
        let loaded = Registry::load(&path).unwrap();

        assert_eq!(loaded, registry);
        assert_eq!(
            loaded.get("b").unwrap().prefs[1],
            PrefDeclaration::new("browser.uidensity", "compact", false)
        );
    }

    #[test]
    fn test_load_legacy_clone_url() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nyoom.toml");
        fs::write(
            &path,
            r#"
profile = "/tmp/profile"

[[userchromes]]
name = "edge"
clone_url = "https://github.com/bmFtZQ/edge-frfox"

[[userchromes.configs]]
key = "layout.css.has-selector.enabled"
value = "true"
raw = true

[[userchromes.configs]]
key = "widget.content.gtk-theme-override"
value = "Adwaita"
"#,
        )
        .unwrap();

        let registry = Registry::load(&path).unwrap();
        let edge = registry.get("edge").unwrap();

        assert_eq!(registry.profile.as_deref(), Some(Path::new("/tmp/profile")));
        assert_eq!(edge.source, "https://github.com/bmFtZQ/edge-frfox");
        assert_eq!(edge.prefs.len(), 2);
        assert!(!edge.prefs[1].raw);
    }

    #[test]
    fn test_load_invalid_toml_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nyoom.toml");
        fs::write(&path, "profile = [unterminated").unwrap();

        assert!(Registry::load(&path).is_err());
    }
}
