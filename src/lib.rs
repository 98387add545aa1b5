//! HD wallet plugin core for Bitcoin and its forks.
//!
//! One engine implementation serves several currencies; everything that
//! differs per coin is data in the [`network::NetworkRegistry`].

pub mod address;
pub mod cache;
pub mod crypto;
pub mod info;
pub mod keys;
pub mod network;
pub mod plugin;
pub mod uri;

pub use network::NetworkRegistry;
pub use plugin::{CurrencyPlugin, CurrencyPluginFactory, PluginError, PluginIo, make_core_plugins};
