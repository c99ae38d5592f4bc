//! Typed errors for the registry and the sync engine.
//!
//! The command layer wraps these in `anyhow` and `main` decides the exit
//! code, so nothing below it terminates the process.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NyoomError {
    #[error("no userchrome with name {0:?} exists")]
    ThemeNotFound(String),

    #[error("userchrome {name:?} has no config {key:?}")]
    PrefNotFound { name: String, key: String },

    #[error("no preset named {0:?} exists")]
    PresetNotFound(String),

    #[error("no installed userchrome found in {}", .0.display())]
    NoInstalledTheme(PathBuf),

    #[error("no profile configured, set one with `nyoom profile <path>`")]
    NoProfile,

    /// Firefox holds the profile open and would overwrite `user.js` on exit
    #[error("Firefox is running, refusing to continue (pass --no-running-check to override)")]
    FirefoxRunning,

    #[error("userchrome with name {0:?} already exists")]
    NameConflict(String),

    #[error("userchrome with source {location:?} already exists: {existing}")]
    SourceConflict { location: String, existing: String },

    #[error("invalid source {location:?}: {reason}")]
    InvalidSource { location: String, reason: String },

    #[error("failed to fetch {location:?}: {reason}")]
    Fetch { location: String, reason: String },

    #[error("arkenfox script {} failed: {reason}", .script.display())]
    Script { script: PathBuf, reason: String },

    /// Filesystem failure with the operation and path that caused it
    #[error("failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl NyoomError {
    /// Adapter for `map_err` at filesystem call sites
    pub fn io(action: &'static str, path: &Path) -> impl FnOnce(io::Error) -> Self {
        let path = path.to_path_buf();
        move |source| Self::Io { action, path, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_adapter_keeps_path_and_action() {
        let err = NyoomError::io("read", Path::new("/tmp/user.js"))(io::Error::from(io::ErrorKind::NotFound));
        match &err {
            NyoomError::Io { action, path, source } => {
                assert_eq!(*action, "read");
                assert_eq!(path, Path::new("/tmp/user.js"));
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
        assert!(err.to_string().starts_with("failed to read /tmp/user.js"));
    }

    #[test]
    fn test_conflict_messages() {
        let err = NyoomError::SourceConflict {
            location: "https://example.com/a.git".to_string(),
            existing: "a".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "userchrome with source \"https://example.com/a.git\" already exists: a"
        );
    }
}
