//! Running-browser guard
//!
//! Firefox rewrites `prefs.js` and holds `chrome/` open while it runs, so
//! profile changes made underneath it are lost or half-applied.

use std::ffi::OsStr;

use sysinfo::{ProcessRefreshKind, RefreshKind, System};
use tracing::debug;

use crate::constants::firefox::PROCESS_NAME;
use crate::error::NyoomError;

/// Processes whose name contains `firefox`
pub fn running_instances() -> usize {
    let system = System::new_with_specifics(
        RefreshKind::nothing().with_processes(ProcessRefreshKind::nothing()),
    );
    system.processes_by_name(OsStr::new(PROCESS_NAME)).count()
}

/// `FirefoxRunning` when any Firefox process is alive
pub fn ensure_not_running() -> Result<(), NyoomError> {
    refuse_if_running(running_instances())
}

fn refuse_if_running(instances: usize) -> Result<(), NyoomError> {
    debug!(instances, "Checked for a running Firefox");
    if instances == 0 {
        Ok(())
    } else {
        Err(NyoomError::FirefoxRunning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refuses_when_instances_found() {
        assert!(refuse_if_running(0).is_ok());
        assert!(matches!(refuse_if_running(1), Err(NyoomError::FirefoxRunning)));
        assert!(matches!(refuse_if_running(3), Err(NyoomError::FirefoxRunning)));
    }

    #[test]
    fn test_running_message_names_override_flag() {
        assert!(NyoomError::FirefoxRunning.to_string().contains("--no-running-check"));
    }
}
