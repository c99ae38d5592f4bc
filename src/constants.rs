//! Application-wide constants
//!
//! File names, sentinel lines and preference keys shared by the registry,
//! the sync engine and the command layer.

/// Registry file location
pub mod config {
    /// Directory under the user's config dir
    pub const APP_DIR: &str = "nyoom";

    /// Registry file name
    pub const FILENAME: &str = "nyoom.toml";

    /// Environment variable overriding the registry path
    pub const PATH_ENV: &str = "NYOOM_CONFIG";
}

/// Process names checked before touching a profile
pub mod firefox {
    pub const PROCESS_NAME: &str = "firefox";
}

/// Profile layout
pub mod profile {
    /// Theme directory inside the profile (and conventional subfolder in theme repos)
    pub const CHROME_DIR: &str = "chrome";

    /// Marker written into an installed chrome directory, holds the theme name
    pub const CHROME_NAME_MARKER: &str = ".nyoom-chrome-name";

    /// arkenfox override file, preferred when present
    pub const USER_OVERRIDES_JS: &str = "user-overrides.js";

    /// Plain preference file
    pub const USER_JS: &str = "user.js";

    /// `nyoom switch out` uninstalls instead of switching
    pub const SWITCH_OUT: &str = "out";
}

/// Managed preference block
pub mod prefs {
    /// Opening sentinel of the managed block
    pub const START_LINE: &str = "/** nyoom-managed config; do not edit */";

    /// Closing sentinel of the managed block
    pub const END_LINE: &str = "/** end of nyoom-managed config */";

    /// Always rendered first so Firefox loads userChrome.css at all
    pub const LEGACY_STYLESHEETS_KEY: &str = "toolkit.legacyUserProfileCustomizations.stylesheets";
}

/// Source fetching
pub mod fetch {
    /// Git executable used for remote sources
    pub const GIT: &str = "git";

    /// Explicit local-directory source prefix
    pub const PATH_PREFIX: &str = "path:";

    /// Repository metadata never copied into a profile
    pub const GIT_DIR: &str = ".git";

    /// Hosted shorthands: prefix, clone base, whether nested groups are allowed
    pub const SHORTHAND_HOSTS: &[(&str, &str, bool)] = &[
        ("github:", "https://github.com", false),
        ("codeberg:", "https://codeberg.org", false),
        ("gitlab:", "https://gitlab.com", true),
    ];
}

/// arkenfox maintenance scripts
pub mod arkenfox {
    #[cfg(windows)]
    pub const SCRIPT_SUFFIX: &str = ".bat";
    #[cfg(not(windows))]
    pub const SCRIPT_SUFFIX: &str = ".sh";

    pub const UPDATER: &str = "updater";
    pub const PREFS_CLEANER: &str = "prefsCleaner";

    /// Silent mode flag accepted by both scripts
    pub const SILENT_FLAG: &str = "-s";
}
