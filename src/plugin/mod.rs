//! Host plugin surface.
//!
//! A `CurrencyPluginFactory` turns the host's capability bundle (`PluginIo`)
//! into a `CurrencyPlugin`, which exposes the currency metadata plus the two
//! async entry points:
//!
//! - `make_currency_tools`: builds the per-plugin `CurrencyTools` and loads the
//!   shared cache exactly once, however many callers race for it.
//! - `make_currency_engine`: waits for the tools, builds an engine for one
//!   wallet through the configured `EngineBuilder` and loads it.

/// Engine trait, context and the default cache-backed engine
pub mod engine;
/// Plugin factories and instances
pub mod factory;
/// Host capability bundle
pub mod io;
/// Single-flight once cell
pub mod once;
/// Key, address and URI operations bound to one network
pub mod tools;
/// Plugin errors and engine options
pub mod types;

pub use engine::{CacheEngine, CacheEngineBuilder, CurrencyEngine, EngineBuilder, EngineContext};
pub use factory::{CurrencyPlugin, CurrencyPluginFactory, make_core_plugins};
pub use io::PluginIo;
pub use once::OnceHandle;
pub use tools::CurrencyTools;
pub use types::*;
