//! Managed preference block
//!
//! The profile's `user.js` (or arkenfox's `user-overrides.js`) gets one block
//! delimited by two sentinel comment lines. Everything between them belongs to
//! nyoom and is rewritten on every sync; everything outside is left byte-for-byte.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::fsops::{backup_path, write_atomic};
use crate::config::PrefDeclaration;
use crate::constants::prefs::{END_LINE, LEGACY_STYLESHEETS_KEY, START_LINE};
use crate::constants::profile::{USER_JS, USER_OVERRIDES_JS};
use crate::error::NyoomError;

/// The preference file a profile uses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefFile {
    pub path: PathBuf,
    /// Profile is managed by arkenfox (`user-overrides.js` exists)
    pub arkenfox: bool,
}

impl PrefFile {
    pub fn locate(profile: &Path) -> Self {
        let overrides = profile.join(USER_OVERRIDES_JS);
        if overrides.exists() {
            Self {
                path: overrides,
                arkenfox: true,
            }
        } else {
            Self {
                path: profile.join(USER_JS),
                arkenfox: false,
            }
        }
    }
}

/// Where the managed block sits in a file, by line index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block {
    Found { start: usize, end: usize },
    Absent,
    /// A sentinel without its partner
    Corrupt,
}

pub fn render(pref: &PrefDeclaration) -> String {
    if pref.raw {
        format!("user_pref(\"{}\", {});", pref.key, pref.value)
    } else {
        format!("user_pref(\"{}\", \"{}\");", pref.key, pref.value)
    }
}

/// Block body: the stylesheet switch first, then `prefs` in stored order
pub fn render_all(prefs: &[PrefDeclaration]) -> Vec<String> {
    let stylesheets = PrefDeclaration::new(LEGACY_STYLESHEETS_KEY, "true", true);
    std::iter::once(&stylesheets).chain(prefs).map(render).collect()
}

fn is_line(line: &str, sentinel: &str) -> bool {
    line.strip_suffix('\r').unwrap_or(line) == sentinel
}

/// Pairs the first closing sentinel that follows an opening one with the
/// nearest opening sentinel above it. Stray sentinels elsewhere are ignored.
pub fn locate_block(lines: &[&str]) -> Block {
    let mut start = None;
    for (idx, line) in lines.iter().enumerate() {
        if is_line(line, START_LINE) {
            start = Some(idx);
        } else if is_line(line, END_LINE)
            && let Some(start) = start
        {
            return Block::Found { start, end: idx };
        }
    }

    if lines.iter().any(|l| is_line(l, START_LINE) || is_line(l, END_LINE)) {
        Block::Corrupt
    } else {
        Block::Absent
    }
}

/// New file contents with the managed block holding `prefs`
pub fn merge(contents: &str, prefs: &[PrefDeclaration]) -> String {
    // Match the file's line endings for anything we insert
    let eol_cr = if contents.contains("\r\n") { "\r" } else { "" };
    let rendered = render_all(prefs);

    let mut lines: Vec<&str> = contents.split('\n').collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len() + rendered.len() + 3);

    match locate_block(&lines) {
        Block::Found { start, end } => {
            debug!(start, end, "Replacing managed block");
            out.extend(lines[..=start].iter().map(|l| l.to_string()));
            out.extend(rendered.into_iter().map(|l| l + eol_cr));
            out.extend(lines[end..].iter().map(|l| l.to_string()));
        }
        block => {
            if block == Block::Corrupt {
                // Appending can leave a stray sentinel behind; it is not removed
                warn!("Found an unpaired nyoom sentinel line, appending a new managed block");
            }
            if lines.last() == Some(&"") {
                lines.pop();
            }
            out.extend(lines.iter().map(|l| l.to_string()));
            out.push(format!("{START_LINE}{eol_cr}"));
            out.extend(rendered.into_iter().map(|l| l + eol_cr));
            out.push(format!("{END_LINE}{eol_cr}"));
        }
    }

    if out.last().is_none_or(|l| !l.is_empty()) {
        out.push(String::new());
    }

    out.join("\n")
}

/// Rewrite the managed block of an existing preference file.
///
/// A file without a block is copied to `<file>.nyoom-<secs>.bak` before the
/// block is first appended.
pub fn merge_file(path: &Path, prefs: &[PrefDeclaration]) -> Result<(), NyoomError> {
    let contents = fs::read_to_string(path).map_err(NyoomError::io("read", path))?;
    let merged = merge(&contents, prefs);

    if merged == contents {
        debug!(path = %path.display(), "Preference file already up to date");
        return Ok(());
    }

    let lines: Vec<&str> = contents.split('\n').collect();
    if !matches!(locate_block(&lines), Block::Found { .. }) {
        let backup = backup_path(path);
        fs::copy(path, &backup).map_err(NyoomError::io("back up", path))?;
        info!(backup = %backup.display(), "Backed up preference file before adding the managed block");
    }

    write_atomic(path, &merged)?;
    info!(path = %path.display(), prefs = prefs.len() + 1, "Applied managed preferences");
    Ok(())
}
