//! Switch orchestration: materialize the theme (or remove it), then merge its prefs

use std::fmt;
use std::path::Path;
use tracing::{info, warn};

use super::arkenfox;
use super::fetch::Fetch;
use super::materialize::{materialize, uninstall};
use super::prefs::{self, PrefFile};
use crate::config::ThemeEntry;
use crate::constants::profile::CHROME_DIR;
use crate::error::NyoomError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Retrieving,
    Installing,
    Removing,
    ApplyingPrefs,
    UpdatingArkenfox,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Retrieving => "retrieving source",
            Stage::Installing => "installing userchrome",
            Stage::Removing => "removing userchrome",
            Stage::ApplyingPrefs => "applying user.js",
            Stage::UpdatingArkenfox => "updating arkenfox",
            Stage::Done => "done!",
        })
    }
}

/// Install `entry` into `profile`, or with `None` remove the installed theme
/// and reset the managed block to the stylesheet switch alone. Each stage is
/// reported to `on_stage` before it runs.
///
/// The chrome swap commits before prefs are merged, so a merge failure leaves
/// the new chrome with the old preferences.
pub fn switch(
    entry: Option<&ThemeEntry>,
    profile: &Path,
    fetcher: &dyn Fetch,
    mut on_stage: impl FnMut(Stage),
) -> Result<(), NyoomError> {
    let chrome = profile.join(CHROME_DIR);

    match entry {
        Some(entry) => {
            info!(theme = %entry.name, profile = %profile.display(), "Switching userchrome");
            on_stage(Stage::Retrieving);
            materialize(fetcher, &entry.source, &chrome, &entry.name, || {
                on_stage(Stage::Installing)
            })?;
        }
        None => {
            info!(profile = %profile.display(), "Removing userchrome");
            on_stage(Stage::Removing);
            uninstall(&chrome)?;
        }
    }

    on_stage(Stage::ApplyingPrefs);
    let pref_file = PrefFile::locate(profile);
    let prefs = entry.map_or(&[][..], |e| e.prefs.as_slice());
    prefs::merge_file(&pref_file.path, prefs).inspect_err(|e| {
        warn!(error = %e, "Chrome was updated but preferences were not applied");
    })?;

    if pref_file.arkenfox && arkenfox::scripts_present(profile) {
        on_stage(Stage::UpdatingArkenfox);
        arkenfox::run_maintenance(profile)?;
    }

    on_stage(Stage::Done);
    Ok(())
}
