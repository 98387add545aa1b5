//! Capability bundle the host hands to a plugin.

use crate::cache::{CacheConfig, FilePluginStorage, PluginStorage};
use crate::crypto::{CryptoProvider, NativeCrypto, OsRandom, RandomSource};

use std::path::Path;
use std::sync::Arc;
use tracing::{Span, info_span};

#[derive(Clone)]
pub struct PluginIo {
	pub random: Arc<dyn RandomSource>,
	pub crypto: Arc<dyn CryptoProvider>,
	/// Storage scoped to this plugin
	pub storage: Arc<dyn PluginStorage>,
	/// Setting overrides laid over the plugin's compiled-in defaults
	pub settings_overrides: serde_json::Value,
	pub cache_config: CacheConfig,
	/// Structured logging context for everything the plugin does
	pub log: Span,
}

impl PluginIo {
	pub fn new(
		random: Arc<dyn RandomSource>,
		crypto: Arc<dyn CryptoProvider>,
		storage: Arc<dyn PluginStorage>,
		log: Span,
	) -> Self {
		Self {
			random,
			crypto,
			storage,
			settings_overrides: serde_json::Value::Null,
			cache_config: CacheConfig::default(),
			log,
		}
	}

	/// OS randomness, native crypto and files under `<data_dir>/<plugin_name>`.
	pub fn native(data_dir: &Path, plugin_name: &str) -> Self {
		Self::new(
			Arc::new(OsRandom),
			Arc::new(NativeCrypto::new()),
			Arc::new(FilePluginStorage::new(data_dir.join(plugin_name))),
			info_span!("plugin", name = %plugin_name),
		)
	}

	pub fn with_settings_overrides(mut self, overrides: serde_json::Value) -> Self {
		self.settings_overrides = overrides;
		self
	}

	pub fn with_cache_config(mut self, config: CacheConfig) -> Self {
		self.cache_config = config;
		self
	}
}
