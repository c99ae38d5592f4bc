//! Profile sync engine
//!
//! - **fetch**: getting a theme source onto disk (git, hosted shorthand or local copy)
//! - **materialize**: swapping the fetched tree into `<profile>/chrome`, or removing it
//! - **prefs**: rendering and merging the managed block in `user.js`
//! - **arkenfox**: running arkenfox's maintenance scripts after a merge
//! - **switch**: the whole switch, stage by stage

pub mod arkenfox;
pub mod fetch;
mod fsops;
pub mod materialize;
pub mod prefs;
pub mod switch;

pub use fetch::{SourceFetcher, canonical_source};
pub use materialize::installed_theme;
pub use switch::{Stage, switch};
