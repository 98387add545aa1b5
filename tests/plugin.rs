use fork_wallet_core::cache::{
	BlockHeader, CacheConfig, CacheError, FilePluginStorage, MemoryPluginStorage, PluginStorage,
	ServerInfo,
};
use fork_wallet_core::crypto::{NativeCrypto, OsRandom};
use fork_wallet_core::info::all_info;
use fork_wallet_core::keys::{CreatePrivateKeyOptions, WalletInfo};
use fork_wallet_core::plugin::{
	CacheEngineBuilder, CurrencyEngine, EngineBuilder, EngineContext, EngineOptions,
};
use fork_wallet_core::{
	CurrencyPlugin, CurrencyPluginFactory, NetworkRegistry, PluginError, PluginIo,
	make_core_plugins,
};

use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::Span;

/// Storage that counts reads and can be slowed down to widen race windows.
struct CountingStorage {
	inner: MemoryPluginStorage,
	reads: AtomicUsize,
	delay: Duration,
}

impl CountingStorage {
	fn new(delay: Duration) -> Self {
		Self {
			inner: MemoryPluginStorage::new(),
			reads: AtomicUsize::new(0),
			delay,
		}
	}
}

#[async_trait::async_trait]
impl PluginStorage for CountingStorage {
	async fn read(&self, name: &str) -> Result<Option<String>, CacheError> {
		self.reads.fetch_add(1, Ordering::SeqCst);
		tokio::time::sleep(self.delay).await;
		self.inner.read(name).await
	}

	async fn write(&self, name: &str, contents: &str) -> Result<(), CacheError> {
		self.inner.write(name, contents).await
	}
}

struct CountingEngine {
	wallet_id: String,
	loads: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl CurrencyEngine for CountingEngine {
	async fn load(&mut self) -> Result<(), PluginError> {
		self.loads.fetch_add(1, Ordering::SeqCst);
		Ok(())
	}

	fn wallet_id(&self) -> &str {
		&self.wallet_id
	}

	async fn block_height(&self) -> u64 {
		0
	}

	fn receive_address(&self) -> Option<&str> {
		None
	}
}

#[derive(Default)]
struct CountingBuilder {
	builds: AtomicUsize,
	loads: Arc<AtomicUsize>,
}

impl EngineBuilder for CountingBuilder {
	fn build(&self, context: EngineContext) -> Result<Box<dyn CurrencyEngine>, PluginError> {
		self.builds.fetch_add(1, Ordering::SeqCst);
		Ok(Box::new(CountingEngine {
			wallet_id: context.wallet_info.id.clone(),
			loads: self.loads.clone(),
		}))
	}
}

fn io(storage: Arc<dyn PluginStorage>) -> PluginIo {
	PluginIo::new(
		Arc::new(OsRandom),
		Arc::new(NativeCrypto::new()),
		storage,
		Span::none(),
	)
}

fn factory(plugin_name: &str, engines: Arc<dyn EngineBuilder>) -> CurrencyPluginFactory {
	make_core_plugins(all_info(), NetworkRegistry::builtin().unwrap(), engines)
		.remove(plugin_name)
		.unwrap()
}

async fn new_wallet(plugin: &CurrencyPlugin, id: &str) -> WalletInfo {
	let tools = plugin.make_currency_tools().await.unwrap();
	let wallet_type = WalletInfo::wallet_type_for(tools.network());
	let keys = tools
		.create_private_key(&wallet_type, &CreatePrivateKeyOptions::default())
		.await
		.unwrap();
	WalletInfo {
		id: id.to_string(),
		wallet_type,
		keys,
	}
}

fn header(height: u64) -> BlockHeader {
	BlockHeader {
		hash: hex::encode(height.to_be_bytes()),
		prev_hash: None,
		timestamp: 1_600_000_000,
	}
}

#[tokio::test]
async fn test_concurrent_tools_share_one_cache_load() {
	let storage = Arc::new(CountingStorage::new(Duration::from_millis(20)));
	let plugin = factory("litecoin", Arc::new(CacheEngineBuilder))
		.make_plugin(io(storage.clone()))
		.unwrap();

	let results =
		futures::future::join_all((0..10).map(|_| plugin.make_currency_tools())).await;

	let first = results[0].clone().unwrap();
	for result in results {
		assert!(Arc::ptr_eq(&first, &result.unwrap()));
	}
	// one load touches the header file and the server file once each
	assert_eq!(storage.reads.load(Ordering::SeqCst), 2);

	plugin.make_currency_tools().await.unwrap();
	assert_eq!(storage.reads.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_cache_survives_restart() {
	let dir = tempfile::tempdir().unwrap();
	let servers = vec![ServerInfo::new("electrum://ltc.example.org:50001")];

	{
		let plugin = factory("litecoin", Arc::new(CacheEngineBuilder))
			.make_plugin(PluginIo::native(dir.path(), "litecoin"))
			.unwrap();
		let tools = plugin.make_currency_tools().await.unwrap();
		tools.plugin_state().put_header(100, header(100)).await;
		tools.plugin_state().put_servers(servers.clone()).await;
		tools.plugin_state().save().await.unwrap();
	}

	let plugin = factory("litecoin", Arc::new(CacheEngineBuilder))
		.make_plugin(PluginIo::native(dir.path(), "litecoin"))
		.unwrap();
	let tools = plugin.make_currency_tools().await.unwrap();
	assert_eq!(tools.plugin_state().get_header(100).await, Some(header(100)));
	assert_eq!(tools.plugin_state().height().await, 100);
	assert_eq!(tools.plugin_state().get_servers().await, servers);
}

#[tokio::test]
async fn test_close_flushes_pending_mutations() {
	let dir = tempfile::tempdir().unwrap();
	let plugin = factory("bitcoin", Arc::new(CacheEngineBuilder))
		.make_plugin(PluginIo::native(dir.path(), "bitcoin"))
		.unwrap();
	let tools = plugin.make_currency_tools().await.unwrap();
	tools.plugin_state().put_header(7, header(7)).await;
	plugin.close().await.unwrap();

	let stored = FilePluginStorage::new(dir.path().join("bitcoin"))
		.read("headers.json")
		.await
		.unwrap()
		.unwrap();
	let stored: serde_json::Value = serde_json::from_str(&stored).unwrap();
	assert_eq!(stored["height"], json!(7));
}

#[tokio::test]
async fn test_corrupt_optional_file_degrades_only_that_cache() {
	let storage = Arc::new(MemoryPluginStorage::new());
	let plugin = factory("bitcoin", Arc::new(CacheEngineBuilder))
		.make_plugin(io(storage.clone()))
		.unwrap();
	{
		let tools = factory("bitcoin", Arc::new(CacheEngineBuilder))
			.make_plugin(io(storage.clone()))
			.unwrap()
			.make_currency_tools()
			.await
			.unwrap();
		tools.plugin_state().put_header(5, header(5)).await;
		tools.plugin_state().save().await.unwrap();
	}
	storage.write("serverCache.json", "not json").await.unwrap();

	let tools = plugin.make_currency_tools().await.unwrap();
	assert_eq!(tools.plugin_state().get_header(5).await, Some(header(5)));
	assert!(tools.plugin_state().get_servers().await.is_empty());
}

#[tokio::test]
async fn test_required_file_failure_blocks_engine() {
	let storage = Arc::new(MemoryPluginStorage::new());
	storage.write("headers.json", "{\"headers\": ").await.unwrap();
	let builder = Arc::new(CountingBuilder::default());
	let config = CacheConfig {
		headers_required: true,
		..CacheConfig::default()
	};
	let plugin = factory("dogecoin", builder.clone())
		.make_plugin(io(storage).with_cache_config(config))
		.unwrap();

	let wallet = WalletInfo {
		id: "w1".to_string(),
		wallet_type: "wallet:dogecoin".to_string(),
		keys: Default::default(),
	};
	let first = plugin
		.make_currency_engine(wallet.clone(), EngineOptions::default())
		.await
		.err()
		.unwrap();
	assert!(matches!(first, PluginError::Cache(CacheError::Corrupt { .. })));

	let second = plugin
		.make_currency_engine(wallet, EngineOptions::default())
		.await
		.err()
		.unwrap();
	assert_eq!(first, second);
	assert_eq!(builder.builds.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_engine_loaded_once_per_creation() {
	let builder = Arc::new(CountingBuilder::default());
	let plugin = factory("bitcoincash", builder.clone())
		.make_plugin(io(Arc::new(MemoryPluginStorage::new())))
		.unwrap();
	let wallet = new_wallet(&plugin, "bch-1").await;

	let engine = plugin
		.make_currency_engine(wallet, EngineOptions::default())
		.await
		.unwrap();
	assert_eq!(engine.wallet_id(), "bch-1");
	assert_eq!(builder.builds.load(Ordering::SeqCst), 1);
	assert_eq!(builder.loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_settings_overrides_apply_to_engines() {
	let overrides = json!({
		"electrumServers": ["electrum://override.example.org:50001"],
		"notASetting": true,
	});
	let plugin = factory("litecoin", Arc::new(CacheEngineBuilder))
		.make_plugin(io(Arc::new(MemoryPluginStorage::new())).with_settings_overrides(overrides))
		.unwrap();
	let wallet = new_wallet(&plugin, "ltc-1").await;
	let tools = plugin.make_currency_tools().await.unwrap();

	let settings = tools.plugin_state().settings().await;
	assert_eq!(
		settings.electrum_servers,
		vec!["electrum://override.example.org:50001".to_string()]
	);
	assert!(tools.plugin_state().raw_settings().await.get("notASetting").is_none());

	let expected = tools.derive_address(&wallet, 0, 0).await.unwrap();
	let engine = plugin
		.make_currency_engine(wallet, EngineOptions::default())
		.await
		.unwrap();
	assert_eq!(engine.receive_address(), Some(expected.as_str()));
}
