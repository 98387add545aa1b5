//! Network parameter registry for the supported forks.
//!
//! Every per-coin difference the plugin family cares about (address version
//! bytes, extended key prefixes, supported derivation standards, fork
//! families) lives here as data.

/// Built-in parameter table
pub mod networks;
/// Append-only registry and fork family queries
pub mod registry;
/// Parameter and error types
pub mod types;

pub use registry::NetworkRegistry;
pub use types::*;
