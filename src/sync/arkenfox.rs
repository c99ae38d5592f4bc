//! arkenfox maintenance
//!
//! arkenfox profiles keep their own `user.js` and expect changes in
//! `user-overrides.js`; the bundled updater folds the overrides back in and
//! prefsCleaner resets prefs that were dropped.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};

use crate::constants::arkenfox::{PREFS_CLEANER, SCRIPT_SUFFIX, SILENT_FLAG, UPDATER};
use crate::error::NyoomError;

fn script_path(profile: &Path, name: &str) -> PathBuf {
    profile.join(format!("{name}{SCRIPT_SUFFIX}"))
}

/// Whether any maintenance script ships with this profile
pub fn scripts_present(profile: &Path) -> bool {
    [UPDATER, PREFS_CLEANER]
        .iter()
        .any(|name| script_path(profile, name).is_file())
}

/// Run the updater, then prefsCleaner. Missing scripts are skipped.
pub fn run_maintenance(profile: &Path) -> Result<(), NyoomError> {
    for name in [UPDATER, PREFS_CLEANER] {
        run_script(profile, name)?;
    }
    Ok(())
}

fn run_script(profile: &Path, name: &str) -> Result<(), NyoomError> {
    let script = script_path(profile, name);
    if !script.is_file() {
        debug!(script = %script.display(), "arkenfox script not present, skipping");
        return Ok(());
    }

    info!(script = %script.display(), "Running arkenfox script");
    let output = Command::new(&script)
        .arg(SILENT_FLAG)
        .current_dir(profile)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| NyoomError::Script {
            script: script.clone(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(NyoomError::Script {
            script,
            reason: if stderr.is_empty() {
                format!("exited with {}", output.status)
            } else {
                stderr
            },
        });
    }

    Ok(())
}
