//! Plugin state cache.
//!
//! - `state`: the shared in-memory cache with load/save and debounced flushing.
//! - `storage`: the file-storage capability the host provides, with file and
//!   in-memory implementations.
//! - `types`: persisted records, configuration and errors.

/// Shared header/server cache
pub mod state;
/// Storage backends
pub mod storage;
/// Cache records, configuration and errors
pub mod types;

pub use state::{PluginStateCache, merge_settings};
pub use storage::{FilePluginStorage, MemoryPluginStorage, PluginStorage};
pub use types::*;
