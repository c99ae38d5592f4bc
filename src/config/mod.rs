//! Theme registry
//!
//! - **entry**: ThemeEntry / PrefDeclaration and their set/unset rules
//! - **registry**: Registry loaded from and saved to the TOML file

pub mod entry;
pub mod registry;

pub use entry::{PrefDeclaration, ThemeEntry};
pub use registry::Registry;
