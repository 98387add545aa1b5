//! Engine seam.
//!
//! The core does not sync wallets itself. A host or a coin-specific crate
//! supplies an `EngineBuilder`; the core hands it the shared tools and the
//! wallet's keys, then drives `load` before returning the engine.

use crate::cache::PluginStateCache;
use crate::keys::WalletInfo;
use crate::plugin::tools::CurrencyTools;
use crate::plugin::types::{EngineOptions, PluginError};

use std::sync::Arc;
use tracing::{debug, info};

/// A per-wallet synchronization engine.
#[async_trait::async_trait]
pub trait CurrencyEngine: Send + Sync {
	/// Prepare the engine for use. Called exactly once, before the engine is
	/// handed to the host.
	async fn load(&mut self) -> Result<(), PluginError>;

	fn wallet_id(&self) -> &str;

	/// Best block height known to the engine
	async fn block_height(&self) -> u64;

	/// Address the wallet currently receives on, once loaded
	fn receive_address(&self) -> Option<&str>;
}

/// Everything an engine is bound to.
#[derive(Clone)]
pub struct EngineContext {
	pub tools: Arc<CurrencyTools>,
	pub wallet_info: WalletInfo,
	pub options: EngineOptions,
}

impl EngineContext {
	pub fn plugin_state(&self) -> &PluginStateCache {
		self.tools.plugin_state()
	}

	pub fn network(&self) -> &str {
		self.tools.network()
	}
}

/// Constructs engines for a plugin.
pub trait EngineBuilder: Send + Sync {
	fn build(&self, context: EngineContext) -> Result<Box<dyn CurrencyEngine>, PluginError>;
}

/// Engine that serves everything from the shared plugin cache.
pub struct CacheEngine {
	context: EngineContext,
	receive_address: Option<String>,
}

impl CacheEngine {
	pub fn new(context: EngineContext) -> Self {
		Self {
			context,
			receive_address: None,
		}
	}
}

#[async_trait::async_trait]
impl CurrencyEngine for CacheEngine {
	async fn load(&mut self) -> Result<(), PluginError> {
		let tools = &self.context.tools;
		let address = tools.derive_address(&self.context.wallet_info, 0, 0).await?;
		let settings = self.context.plugin_state().settings().await;
		info!(
			parent: &tools.io().log,
			"Engine for {} loaded at height {} with {} configured servers",
			self.context.wallet_info.id,
			self.context.plugin_state().height().await,
			settings.electrum_servers.len()
		);
		debug!(parent: &tools.io().log, "Receive address {}", address);
		self.receive_address = Some(address);
		Ok(())
	}

	fn wallet_id(&self) -> &str {
		&self.context.wallet_info.id
	}

	async fn block_height(&self) -> u64 {
		self.context.plugin_state().height().await
	}

	fn receive_address(&self) -> Option<&str> {
		self.receive_address.as_deref()
	}
}

/// Builds a `CacheEngine` for every wallet.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheEngineBuilder;

impl EngineBuilder for CacheEngineBuilder {
	fn build(&self, context: EngineContext) -> Result<Box<dyn CurrencyEngine>, PluginError> {
		Ok(Box::new(CacheEngine::new(context)))
	}
}
