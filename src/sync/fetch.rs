//! Source fetching
//!
//! Remote sources are shallow-cloned with git. `github:`, `codeberg:` and
//! `gitlab:` shorthands expand to https clone URLs, with an optional `#ref`
//! naming the branch or tag. Local directories (bare or `path:` prefixed) are
//! copied.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};

use super::fsops::copy_dir_all;
use crate::constants::fetch::{GIT, PATH_PREFIX, SHORTHAND_HOSTS};
use crate::error::NyoomError;

/// Deposits the tree named by `source` into the existing, empty directory `dest`
pub trait Fetch {
    fn fetch(&self, source: &str, dest: &Path) -> Result<(), NyoomError>;
}

impl<F> Fetch for F
where
    F: Fn(&str, &Path) -> Result<(), NyoomError>,
{
    fn fetch(&self, source: &str, dest: &Path) -> Result<(), NyoomError> {
        self(source, dest)
    }
}

/// A hosted repository written as `<host>:<owner>/<repo>[#ref]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shorthand {
    pub url: String,
    pub branch: Option<String>,
}

impl Shorthand {
    /// `Ok(None)` when `source` uses none of the shorthand prefixes
    pub fn parse(source: &str) -> Result<Option<Self>, NyoomError> {
        let invalid = |reason: &str| NyoomError::InvalidSource {
            location: source.to_string(),
            reason: reason.to_string(),
        };

        for &(prefix, base, nested) in SHORTHAND_HOSTS {
            let Some(rest) = source.strip_prefix(prefix) else {
                continue;
            };
            let (repo, branch) = match rest.split_once('#') {
                Some((repo, branch)) => (repo, Some(branch)),
                None => (rest, None),
            };

            let segments = repo.split('/').count();
            if segments < 2 || (!nested && segments > 2) {
                return Err(invalid(if nested {
                    "expected <group>/<repo>"
                } else {
                    "expected <owner>/<repo>"
                }));
            }
            if !repo.split('/').all(is_name) {
                return Err(invalid("repository path has unsupported characters"));
            }
            if let Some(branch) = branch
                && !is_ref(branch)
            {
                return Err(invalid("ref has unsupported characters"));
            }

            return Ok(Some(Self {
                url: format!("{base}/{repo}.git"),
                branch: branch.map(str::to_string),
            }));
        }

        Ok(None)
    }
}

fn is_name(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
}

fn is_ref(r: &str) -> bool {
    !r.is_empty()
        && !r.starts_with('-')
        && r.chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '/'))
}

/// The form of `source` kept in the registry.
///
/// Local directories are resolved to absolute paths so the entry works from
/// any working directory; a `path:` prefix is kept when given. Shorthands are
/// validated, anything else is stored as typed.
pub fn canonical_source(source: &str) -> Result<String, NyoomError> {
    if Shorthand::parse(source)?.is_some() {
        return Ok(source.to_string());
    }
    let Some(dir) = SourceFetcher::local_path(source) else {
        return Ok(source.to_string());
    };

    let resolved = dir
        .canonicalize()
        .ok()
        .filter(|p| p.is_dir())
        .ok_or_else(|| NyoomError::InvalidSource {
            location: source.to_string(),
            reason: "not a directory".to_string(),
        })?;

    let prefix = if source.starts_with(PATH_PREFIX) { PATH_PREFIX } else { "" };
    Ok(format!("{prefix}{}", resolved.to_string_lossy()))
}

/// `git clone --depth=1`, expanding shorthands first
#[derive(Debug, Default, Clone, Copy)]
pub struct GitFetcher;

impl GitFetcher {
    fn clone_repo(
        &self,
        source: &str,
        url: &str,
        branch: Option<&str>,
        dest: &Path,
    ) -> Result<(), NyoomError> {
        info!(url = %url, branch = ?branch, "Cloning repository");

        let mut cmd = Command::new(GIT);
        cmd.args(["clone", "--depth=1", "--quiet"]);
        if let Some(branch) = branch {
            cmd.args(["--branch", branch]);
        }

        let output = cmd
            .arg("--")
            .arg(url)
            .arg(dest)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| NyoomError::Fetch {
                location: source.to_string(),
                reason: format!("could not run {GIT}: {e}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = match stderr.trim() {
                "" => format!("{GIT} exited with {}", output.status),
                msg => msg.to_string(),
            };
            return Err(NyoomError::Fetch {
                location: source.to_string(),
                reason,
            });
        }

        Ok(())
    }
}

impl Fetch for GitFetcher {
    fn fetch(&self, source: &str, dest: &Path) -> Result<(), NyoomError> {
        match Shorthand::parse(source)? {
            Some(short) => self.clone_repo(source, &short.url, short.branch.as_deref(), dest),
            None => self.clone_repo(source, source, None, dest),
        }
    }
}

/// Copies a directory that already exists on disk
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFetcher;

impl Fetch for LocalFetcher {
    fn fetch(&self, source: &str, dest: &Path) -> Result<(), NyoomError> {
        let dir = Path::new(source.strip_prefix(PATH_PREFIX).unwrap_or(source));
        if !dir.is_dir() {
            return Err(NyoomError::Fetch {
                location: source.to_string(),
                reason: "not a directory".to_string(),
            });
        }

        info!(path = %dir.display(), "Copying local source");
        copy_dir_all(dir, dest, &[])
    }
}

/// Picks git or a local copy depending on what the source looks like
#[derive(Debug, Default, Clone, Copy)]
pub struct SourceFetcher {
    git: GitFetcher,
    local: LocalFetcher,
}

impl SourceFetcher {
    /// Local directory named by `source`, if it names one
    pub fn local_path(source: &str) -> Option<PathBuf> {
        if let Some(path) = source.strip_prefix(PATH_PREFIX) {
            return Some(PathBuf::from(path));
        }
        let path = Path::new(source);
        path.is_dir().then(|| path.to_path_buf())
    }
}

impl Fetch for SourceFetcher {
    fn fetch(&self, source: &str, dest: &Path) -> Result<(), NyoomError> {
        match Self::local_path(source) {
            Some(path) => {
                debug!(source = %source, "Treating source as a local directory");
                self.local.fetch(&path.to_string_lossy(), dest)
            }
            None => self.git.fetch(source, dest),
        }
    }
}
