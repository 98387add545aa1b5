//! Plugin factories and the per-instance plugin object handed to the host.

use crate::info::{CurrencyInfo, CurrencyPluginSettings};
use crate::keys::WalletInfo;
use crate::network::NetworkRegistry;
use crate::plugin::engine::{CurrencyEngine, EngineBuilder, EngineContext};
use crate::plugin::io::PluginIo;
use crate::plugin::once::OnceHandle;
use crate::plugin::tools::CurrencyTools;
use crate::plugin::types::{EngineOptions, PluginError};

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{Instrument, debug, info};

/// Creates plugin instances for one currency.
#[derive(Clone)]
pub struct CurrencyPluginFactory {
	settings: CurrencyPluginSettings,
	registry: Arc<NetworkRegistry>,
	engines: Arc<dyn EngineBuilder>,
}

impl CurrencyPluginFactory {
	pub fn new(
		settings: CurrencyPluginSettings,
		registry: Arc<NetworkRegistry>,
		engines: Arc<dyn EngineBuilder>,
	) -> Self {
		Self {
			settings,
			registry,
			engines,
		}
	}

	pub fn plugin_name(&self) -> &str {
		&self.settings.currency_info.plugin_name
	}

	/// A plugin instance over the host's capabilities. Fails if the plugin's
	/// network is not registered.
	pub fn make_plugin(&self, io: PluginIo) -> Result<CurrencyPlugin, PluginError> {
		self.registry.lookup(&self.settings.engine_info.network)?;
		debug!(parent: &io.log, "Created plugin {}", self.plugin_name());
		Ok(CurrencyPlugin {
			settings: self.settings.clone(),
			registry: self.registry.clone(),
			engines: self.engines.clone(),
			io,
			tools: OnceHandle::new(),
		})
	}
}

/// One factory per entry of `settings`, keyed by plugin name.
pub fn make_core_plugins(
	settings: Vec<CurrencyPluginSettings>,
	registry: Arc<NetworkRegistry>,
	engines: Arc<dyn EngineBuilder>,
) -> BTreeMap<String, CurrencyPluginFactory> {
	settings
		.into_iter()
		.map(|settings| {
			let factory = CurrencyPluginFactory::new(settings, registry.clone(), engines.clone());
			(factory.plugin_name().to_string(), factory)
		})
		.collect()
}

/// A plugin instance. Owns the memoized tools object and, through it, the
/// plugin cache shared by every engine it creates.
pub struct CurrencyPlugin {
	settings: CurrencyPluginSettings,
	registry: Arc<NetworkRegistry>,
	engines: Arc<dyn EngineBuilder>,
	io: PluginIo,
	tools: OnceHandle<Arc<CurrencyTools>, PluginError>,
}

impl CurrencyPlugin {
	pub fn currency_info(&self) -> &CurrencyInfo {
		&self.settings.currency_info
	}

	/// The plugin's tools, built and cache-loaded on first use.
	///
	/// Concurrent first calls share one construction; a failed construction
	/// is returned to every caller from then on.
	pub async fn make_currency_tools(&self) -> Result<Arc<CurrencyTools>, PluginError> {
		let settings = self.settings.clone();
		let registry = self.registry.clone();
		let io = self.io.clone();
		let span = self.io.log.clone();
		self.tools
			.get_or_init(move || {
				async move {
					info!("Building currency tools");
					CurrencyTools::load(settings, registry, io).await.map(Arc::new)
				}
				.instrument(span)
			})
			.await
	}

	/// An engine for `wallet_info`, bound to the shared cache and already
	/// loaded. Never built if the tools could not load their cache.
	pub async fn make_currency_engine(
		&self,
		wallet_info: WalletInfo,
		options: EngineOptions,
	) -> Result<Box<dyn CurrencyEngine>, PluginError> {
		let tools = self.make_currency_tools().await?;
		tools.check_wallet(&wallet_info)?;

		let wallet_id = wallet_info.id.clone();
		let mut engine = self.engines.build(EngineContext {
			tools,
			wallet_info,
			options,
		})?;
		engine.load().instrument(self.io.log.clone()).await?;
		info!(parent: &self.io.log, "Engine ready for wallet {}", wallet_id);
		Ok(engine)
	}

	/// Flush the plugin cache. A no-op if the tools were never built.
	pub async fn close(&self) -> Result<(), PluginError> {
		if let Some(Ok(tools)) = self.tools.get().await {
			tools.plugin_state().shutdown().await?;
			debug!(parent: &self.io.log, "Plugin cache flushed on close");
		}
		Ok(())
	}
}
