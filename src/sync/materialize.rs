//! Directory materializer
//!
//! Fetches a theme into a temporary staging directory, then swaps it into the
//! profile's `chrome/` directory. The new tree is assembled next to the
//! destination and renamed into place, so `chrome/` is never half-copied.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info, warn};

use super::fetch::Fetch;
use super::fsops::{backup_path, copy_dir_all};
use crate::constants::fetch::GIT_DIR;
use crate::constants::profile::{CHROME_DIR, CHROME_NAME_MARKER};
use crate::error::NyoomError;

/// A fetched source waiting to be installed. Dropping it removes the staging dir.
pub struct Staged {
    dir: TempDir,
}

impl Staged {
    /// Fetch `source` into a fresh staging directory
    pub fn fetch(fetcher: &dyn Fetch, source: &str) -> Result<Self, NyoomError> {
        let dir = TempDir::with_prefix("nyoom-")
            .map_err(NyoomError::io("create staging directory in", &std::env::temp_dir()))?;
        debug!(staging = %dir.path().display(), "Created staging directory");

        fetcher.fetch(source, dir.path())?;
        Ok(Self { dir })
    }

    /// `chrome/` inside the fetched tree when present, otherwise the tree itself
    pub fn content_root(&self) -> PathBuf {
        let nested = self.dir.path().join(CHROME_DIR);
        if nested.is_dir() {
            nested
        } else {
            self.dir.path().to_path_buf()
        }
    }

    /// Replace `dest` with the staged content and tag it with `theme_name`
    pub fn install(self, dest: &Path, theme_name: &str) -> Result<(), NyoomError> {
        let root = self.content_root();
        let incoming = sibling(dest, "nyoom-incoming");
        let retired = sibling(dest, "nyoom-retired");

        // Leftovers from an interrupted run
        for stale in [&incoming, &retired] {
            if stale.exists() {
                warn!(path = %stale.display(), "Removing leftover directory");
                fs::remove_dir_all(stale).map_err(NyoomError::io("remove", stale))?;
            }
        }

        let assembled = copy_dir_all(&root, &incoming, &[GIT_DIR]).and_then(|()| {
            let marker = incoming.join(CHROME_NAME_MARKER);
            fs::write(&marker, theme_name).map_err(NyoomError::io("write", &marker))
        });
        if let Err(e) = assembled {
            if let Err(cleanup) = fs::remove_dir_all(&incoming) {
                warn!(path = %incoming.display(), error = %cleanup, "Could not remove partial chrome directory");
            }
            return Err(e);
        }

        let mut retired_existing = false;
        if fs::symlink_metadata(dest).is_ok() {
            if dest.join(CHROME_NAME_MARKER).exists() {
                fs::rename(dest, &retired).map_err(NyoomError::io("move aside", dest))?;
                retired_existing = true;
            } else {
                back_up(dest)?;
            }
        }

        fs::rename(&incoming, dest).map_err(NyoomError::io("move into place", dest))?;
        info!(dest = %dest.display(), theme = %theme_name, "Installed chrome directory");

        if retired_existing {
            fs::remove_dir_all(&retired).map_err(NyoomError::io("remove", &retired))?;
        }

        self.dir
            .close()
            .map_err(NyoomError::io("remove staging directory", &std::env::temp_dir()))?;
        Ok(())
    }
}

/// Fetch `source` and swap it into `dest`. `on_fetched` runs between the two.
pub fn materialize(
    fetcher: &dyn Fetch,
    source: &str,
    dest: &Path,
    theme_name: &str,
    on_fetched: impl FnOnce(),
) -> Result<(), NyoomError> {
    let staged = Staged::fetch(fetcher, source)?;
    on_fetched();
    staged.install(dest, theme_name)
}

/// Remove the installed `dest`. A directory nyoom did not install is backed up instead.
pub fn uninstall(dest: &Path) -> Result<(), NyoomError> {
    if fs::symlink_metadata(dest).is_err() {
        debug!(dest = %dest.display(), "Nothing installed, nothing to remove");
        return Ok(());
    }

    if dest.join(CHROME_NAME_MARKER).exists() {
        fs::remove_dir_all(dest).map_err(NyoomError::io("remove", dest))?;
        info!(dest = %dest.display(), "Removed chrome directory");
        Ok(())
    } else {
        back_up(dest)
    }
}

fn back_up(dest: &Path) -> Result<(), NyoomError> {
    let backup = backup_path(dest);
    warn!(backup = %backup.display(), "Existing chrome directory was not installed by nyoom, backing it up");
    fs::rename(dest, &backup).map_err(NyoomError::io("back up", dest))
}

/// Name of the theme last installed into `chrome_dir`
pub fn installed_theme(chrome_dir: &Path) -> Result<String, NyoomError> {
    let marker = chrome_dir.join(CHROME_NAME_MARKER);
    match fs::read_to_string(&marker) {
        Ok(name) if !name.trim().is_empty() => Ok(name.trim().to_string()),
        Ok(_) => Err(NyoomError::NoInstalledTheme(chrome_dir.to_path_buf())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(NyoomError::NoInstalledTheme(chrome_dir.to_path_buf()))
        }
        Err(e) => Err(NyoomError::io("read", &marker)(e)),
    }
}

/// `<parent>/.<name>.<suffix>`, on the same filesystem as `dest`
fn sibling(dest: &Path, suffix: &str) -> PathBuf {
    dest.with_file_name(format!(".{}.{suffix}", dir_name(dest)))
}

fn dir_name(dest: &Path) -> String {
    dest.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| CHROME_DIR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::fetch::LocalFetcher;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_replace_removes_stale_files() {
        let source = TempDir::new().unwrap();
        write(&source.path().join("chrome/userChrome.css"), "new chrome");
        write(&source.path().join("chrome/parts/tabs.css"), "tabs");
        write(&source.path().join("README.md"), "readme");

        let profile = TempDir::new().unwrap();
        let dest = profile.path().join("chrome");
        write(&dest.join("old.css"), "stale");
        write(&dest.join(CHROME_NAME_MARKER), "previous");

        materialize(&LocalFetcher, &source.path().to_string_lossy(), &dest, "fresh", || {}).unwrap();

        assert!(!dest.join("old.css").exists());
        assert_eq!(fs::read_to_string(dest.join("userChrome.css")).unwrap(), "new chrome");
        assert_eq!(fs::read_to_string(dest.join("parts/tabs.css")).unwrap(), "tabs");
        assert!(!dest.join("README.md").exists());
        assert_eq!(installed_theme(&dest).unwrap(), "fresh");

        // Nothing but the new chrome dir is left in the profile
        assert_eq!(entries(profile.path()), vec!["chrome".to_string()]);
    }

    #[test]
    fn test_flat_layout_uses_root_without_git() {
        let source = TempDir::new().unwrap();
        write(&source.path().join("userChrome.css"), "flat");
        write(&source.path().join(".git/HEAD"), "ref: refs/heads/main");

        let profile = TempDir::new().unwrap();
        let dest = profile.path().join("chrome");

        materialize(&LocalFetcher, &source.path().to_string_lossy(), &dest, "flat", || {}).unwrap();

        assert_eq!(fs::read_to_string(dest.join("userChrome.css")).unwrap(), "flat");
        assert!(!dest.join(".git").exists());
    }

    #[test]
    fn test_unmanaged_chrome_is_backed_up() {
        let source = TempDir::new().unwrap();
        write(&source.path().join("userChrome.css"), "theme");

        let profile = TempDir::new().unwrap();
        let dest = profile.path().join("chrome");
        write(&dest.join("mine.css"), "handwritten");

        materialize(&LocalFetcher, &source.path().to_string_lossy(), &dest, "theme", || {}).unwrap();

        assert!(!dest.join("mine.css").exists());
        let backup = entries(profile.path())
            .into_iter()
            .find(|n| n.starts_with("chrome.nyoom-") && n.ends_with(".bak"))
            .expect("backup directory");
        assert_eq!(
            fs::read_to_string(profile.path().join(backup).join("mine.css")).unwrap(),
            "handwritten"
        );
    }

    #[test]
    fn test_fetch_failure_leaves_destination_untouched() {
        let profile = TempDir::new().unwrap();
        let dest = profile.path().join("chrome");
        write(&dest.join("old.css"), "keep me");

        let failing = |source: &str, _: &Path| -> Result<(), NyoomError> {
            Err(NyoomError::Fetch {
                location: source.to_string(),
                reason: "network unreachable".to_string(),
            })
        };

        let err = materialize(&failing, "https://example.com/x.git", &dest, "x", || {}).unwrap_err();

        assert!(matches!(err, NyoomError::Fetch { .. }));
        assert_eq!(fs::read_to_string(dest.join("old.css")).unwrap(), "keep me");
        assert_eq!(entries(profile.path()), vec!["chrome".to_string()]);
    }

    #[test]
    fn test_creates_missing_destination() {
        let source = TempDir::new().unwrap();
        write(&source.path().join("chrome/userContent.css"), "content");

        let profile = TempDir::new().unwrap();
        let dest = profile.path().join("chrome");

        materialize(&LocalFetcher, &source.path().to_string_lossy(), &dest, "c", || {}).unwrap();

        assert_eq!(fs::read_to_string(dest.join("userContent.css")).unwrap(), "content");
    }

    #[test]
    fn test_failed_assembly_leaves_no_partial_directory() {
        let source = TempDir::new().unwrap();
        write(&source.path().join("userChrome.css"), "theme");
        // a directory where the marker file has to go
        fs::create_dir(source.path().join(CHROME_NAME_MARKER)).unwrap();

        let profile = TempDir::new().unwrap();
        let dest = profile.path().join("chrome");
        write(&dest.join("old.css"), "keep me");

        let err = materialize(&LocalFetcher, &source.path().to_string_lossy(), &dest, "x", || {}).unwrap_err();

        assert!(matches!(err, NyoomError::Io { action: "write", .. }));
        assert_eq!(fs::read_to_string(dest.join("old.css")).unwrap(), "keep me");
        assert_eq!(entries(profile.path()), vec!["chrome".to_string()]);
    }

    #[test]
    fn test_uninstall_removes_managed_chrome() {
        let profile = TempDir::new().unwrap();
        let dest = profile.path().join("chrome");
        write(&dest.join("userChrome.css"), "theme");
        write(&dest.join(CHROME_NAME_MARKER), "theme");

        uninstall(&dest).unwrap();
        assert!(entries(profile.path()).is_empty());

        // already gone
        uninstall(&dest).unwrap();
    }

    #[test]
    fn test_uninstall_backs_up_unmanaged_chrome() {
        let profile = TempDir::new().unwrap();
        let dest = profile.path().join("chrome");
        write(&dest.join("mine.css"), "handwritten");

        uninstall(&dest).unwrap();

        assert!(!dest.exists());
        let names = entries(profile.path());
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("chrome.nyoom-") && names[0].ends_with(".bak"));
    }

    #[test]
    fn test_installed_theme_missing_marker() {
        let profile = TempDir::new().unwrap();
        let err = installed_theme(&profile.path().join("chrome")).unwrap_err();
        assert!(matches!(err, NyoomError::NoInstalledTheme(_)));
    }
}
