//! Persistent per-plugin cache shared by the tools object and every engine.
//!
//! Holds validated block headers and known-good servers, plus the effective
//! settings (compiled-in defaults overlaid with host overrides). Mutations are
//! applied in memory and schedule a debounced flush; `save` writes each file
//! under its own lock from a snapshot taken once that lock is held, so file
//! writes land in snapshot order.
//!
//! At most one flush task runs per cache. A mutation that lands while the task
//! is writing marks the cache dirty and the task goes around again instead of
//! exiting.

use crate::cache::storage::PluginStorage;
use crate::cache::types::{
	BlockHeader, CacheConfig, CacheError, HeaderFile, PluginSettings, ServerFile, ServerInfo,
};

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock, oneshot};
use tokio::task::JoinHandle;
use tracing::{Instrument, Span, debug, error, info, warn};

#[derive(Debug, Default)]
struct CacheState {
	headers: BTreeMap<u64, BlockHeader>,
	servers: Vec<ServerInfo>,
	settings: serde_json::Value,
	typed_settings: PluginSettings,
}

/// The running flush task. Dropping or firing `cancel` stops it while it
/// sleeps; once it is writing it always finishes.
struct PendingFlush {
	id: u64,
	cancel: oneshot::Sender<()>,
	handle: JoinHandle<()>,
}

struct Inner {
	plugin_name: String,
	storage: Arc<dyn PluginStorage>,
	config: CacheConfig,
	default_settings: serde_json::Value,
	overrides: serde_json::Value,
	state: RwLock<CacheState>,
	headers_lock: Mutex<()>,
	servers_lock: Mutex<()>,
	pending_flush: Mutex<Option<PendingFlush>>,
	/// Set by every mutation, cleared by the flush task before it snapshots
	dirty: AtomicBool,
	next_flush_id: AtomicU64,
	span: Span,
}

/// Cheaply cloneable handle; clones share the same state.
#[derive(Clone)]
pub struct PluginStateCache {
	inner: Arc<Inner>,
}

/// Overlay `overrides` onto `defaults`. Only keys present in the defaults
/// are taken from the overrides.
pub fn merge_settings(
	defaults: &serde_json::Value,
	overrides: &serde_json::Value,
) -> serde_json::Value {
	let mut merged = defaults.clone();
	if let (Some(target), Some(overrides)) = (merged.as_object_mut(), overrides.as_object()) {
		for (key, value) in overrides {
			if let Some(slot) = target.get_mut(key) {
				*slot = value.clone();
			}
		}
	}
	merged
}

impl PluginStateCache {
	pub fn new(
		plugin_name: impl Into<String>,
		storage: Arc<dyn PluginStorage>,
		config: CacheConfig,
		default_settings: serde_json::Value,
		overrides: serde_json::Value,
		span: Span,
	) -> Self {
		Self {
			inner: Arc::new(Inner {
				plugin_name: plugin_name.into(),
				storage,
				config,
				default_settings,
				overrides,
				state: RwLock::new(CacheState::default()),
				headers_lock: Mutex::new(()),
				servers_lock: Mutex::new(()),
				pending_flush: Mutex::new(None),
				dirty: AtomicBool::new(false),
				next_flush_id: AtomicU64::new(0),
				span,
			}),
		}
	}

	pub fn plugin_name(&self) -> &str {
		&self.inner.plugin_name
	}

	/// Read one cache file. Absence is an empty cache; unreadable or corrupt
	/// contents are too, unless the file is required.
	async fn load_file<T: DeserializeOwned + Default>(
		&self,
		name: &str,
		required: bool,
	) -> Result<T, CacheError> {
		let parsed = match self.inner.storage.read(name).await {
			Ok(None) => {
				debug!("No {} yet, starting empty", name);
				return Ok(T::default());
			}
			Ok(Some(contents)) => {
				serde_json::from_str::<T>(&contents).map_err(|e| CacheError::Corrupt {
					file: name.to_string(),
					reason: e.to_string(),
				})
			}
			Err(e) => Err(e),
		};
		match parsed {
			Ok(value) => Ok(value),
			Err(e) if required => {
				error!("Required cache file unusable: {}", e);
				Err(e)
			}
			Err(e) => {
				warn!("{}, starting with an empty cache", e);
				Ok(T::default())
			}
		}
	}

	fn effective_settings(&self) -> Result<(serde_json::Value, PluginSettings), CacheError> {
		let merged = merge_settings(&self.inner.default_settings, &self.inner.overrides);
		match serde_json::from_value::<PluginSettings>(merged.clone()) {
			Ok(typed) => Ok((merged, typed)),
			Err(e) => {
				warn!("Ignoring setting overrides that do not fit: {}", e);
				let typed = serde_json::from_value(self.inner.default_settings.clone())
					.map_err(|e| CacheError::Settings(e.to_string()))?;
				Ok((self.inner.default_settings.clone(), typed))
			}
		}
	}

	/// Load both cache files and compute the effective settings.
	pub async fn load(&self) -> Result<(), CacheError> {
		self.load_inner().instrument(self.inner.span.clone()).await
	}

	async fn load_inner(&self) -> Result<(), CacheError> {
		let config = &self.inner.config;
		let headers: HeaderFile = self
			.load_file(&config.headers_file, config.headers_required)
			.await?;
		let servers: ServerFile = self
			.load_file(&config.servers_file, config.servers_required)
			.await?;
		let (settings, typed_settings) = self.effective_settings()?;

		let mut state = self.inner.state.write().await;
		state.headers = headers.headers;
		state.servers = servers.servers;
		state.settings = settings;
		state.typed_settings = typed_settings;
		info!(
			"Loaded plugin cache: {} headers, {} servers",
			state.headers.len(),
			state.servers.len()
		);
		Ok(())
	}

	pub async fn get_header(&self, height: u64) -> Option<BlockHeader> {
		self.inner.state.read().await.headers.get(&height).cloned()
	}

	pub async fn put_header(&self, height: u64, header: BlockHeader) {
		self.inner
			.state
			.write()
			.await
			.headers
			.insert(height, header);
		self.schedule_flush().await;
	}

	/// Highest cached header height.
	pub async fn height(&self) -> u64 {
		self.inner
			.state
			.read()
			.await
			.headers
			.keys()
			.next_back()
			.copied()
			.unwrap_or(0)
	}

	pub async fn get_servers(&self) -> Vec<ServerInfo> {
		self.inner.state.read().await.servers.clone()
	}

	pub async fn put_servers(&self, servers: Vec<ServerInfo>) {
		self.inner.state.write().await.servers = servers;
		self.schedule_flush().await;
	}

	pub async fn settings(&self) -> PluginSettings {
		self.inner.state.read().await.typed_settings.clone()
	}

	/// The merged settings object, including keys the typed view ignores.
	pub async fn raw_settings(&self) -> serde_json::Value {
		self.inner.state.read().await.settings.clone()
	}

	/// Mark the cache dirty and make sure a flush task will pick it up.
	async fn schedule_flush(&self) {
		self.inner.dirty.store(true, Ordering::SeqCst);
		let mut pending = self.inner.pending_flush.lock().await;
		if pending.as_ref().is_some_and(|p| !p.handle.is_finished()) {
			return;
		}
		let id = self.inner.next_flush_id.fetch_add(1, Ordering::SeqCst);
		let (cancel, cancelled) = oneshot::channel();
		let weak: Weak<Inner> = Arc::downgrade(&self.inner);
		let delay = self.inner.config.save_delay;
		let handle = tokio::spawn(
			Self::flush_loop(weak, id, delay, cancelled).instrument(self.inner.span.clone()),
		);
		*pending = Some(PendingFlush { id, cancel, handle });
	}

	async fn flush_loop(
		weak: Weak<Inner>,
		id: u64,
		delay: Duration,
		mut cancelled: oneshot::Receiver<()>,
	) {
		loop {
			tokio::select! {
				_ = tokio::time::sleep(delay) => {}
				_ = &mut cancelled => return,
			}
			let Some(inner) = weak.upgrade() else {
				return;
			};
			let cache = PluginStateCache { inner };

			cache.inner.dirty.store(false, Ordering::SeqCst);
			if let Err(e) = cache.save().await {
				error!("Debounced cache flush failed: {}", e);
				cache.inner.dirty.store(true, Ordering::SeqCst);
			}

			// Decide under the slot lock so a mutation either sees this task
			// still registered or finds the slot empty and spawns a new one.
			let mut pending = cache.inner.pending_flush.lock().await;
			if !pending.as_ref().is_some_and(|p| p.id == id) {
				return;
			}
			if !cache.inner.dirty.load(Ordering::SeqCst) {
				*pending = None;
				return;
			}
			debug!("Cache changed during flush, flushing again");
		}
	}

	/// Snapshot and write one file while holding its lock.
	async fn write_snapshot<T, F>(
		&self,
		name: &str,
		lock: &Mutex<()>,
		snapshot: F,
	) -> Result<T, CacheError>
	where
		T: Serialize,
		F: FnOnce(&CacheState) -> T,
	{
		let _guard = lock.lock().await;
		let value = snapshot(&*self.inner.state.read().await);
		let contents =
			serde_json::to_string(&value).map_err(|e| CacheError::Serialize(e.to_string()))?;
		self.inner.storage.write(name, &contents).await?;
		Ok(value)
	}

	/// Write the current in-memory state to storage.
	pub async fn save(&self) -> Result<(), CacheError> {
		let config = &self.inner.config;
		let headers = self
			.write_snapshot(&config.headers_file, &self.inner.headers_lock, |state| HeaderFile {
				height: state.headers.keys().next_back().copied().unwrap_or(0),
				headers: state.headers.clone(),
				saved_at: Some(chrono::Utc::now().to_rfc3339()),
			})
			.await?;
		self.write_snapshot(&config.servers_file, &self.inner.servers_lock, |state| ServerFile {
			servers: state.servers.clone(),
			saved_at: Some(chrono::Utc::now().to_rfc3339()),
		})
		.await?;
		debug!(
			parent: &self.inner.span,
			"Saved plugin cache at height {}", headers.height
		);
		Ok(())
	}

	/// Stop the flush task and save unconditionally. A flush that is already
	/// writing is allowed to finish first.
	pub async fn shutdown(&self) -> Result<(), CacheError> {
		let pending = self.inner.pending_flush.lock().await.take();
		if let Some(PendingFlush { cancel, handle, .. }) = pending {
			let _ = cancel.send(());
			if let Err(e) = handle.await {
				warn!(parent: &self.inner.span, "Flush task ended abnormally: {}", e);
			}
		}
		self.inner.dirty.store(false, Ordering::SeqCst);
		self.save().await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::cache::storage::{FilePluginStorage, MemoryPluginStorage};
	use serde_json::json;

	fn header(n: u8) -> BlockHeader {
		BlockHeader {
			hash: hex::encode([n; 32]),
			prev_hash: None,
			timestamp: 1_500_000_000 + n as u32,
		}
	}

	fn defaults() -> serde_json::Value {
		json!({
			"electrumServers": ["electrum://a:50001"],
			"infoServer": "https://info",
			"feeInfoServer": "",
			"disableFetchingServers": false,
		})
	}

	fn cache_over(storage: Arc<dyn PluginStorage>, config: CacheConfig) -> PluginStateCache {
		PluginStateCache::new(
			"litecoin",
			storage,
			config,
			defaults(),
			serde_json::Value::Null,
			Span::none(),
		)
	}

	#[tokio::test]
	async fn test_header_survives_restart() {
		let dir = tempfile::tempdir().unwrap();
		let cache = cache_over(
			Arc::new(FilePluginStorage::new(dir.path())),
			CacheConfig::default(),
		);
		cache.load().await.unwrap();
		cache.put_header(100, header(1)).await;
		cache.save().await.unwrap();
		drop(cache);

		let restarted = cache_over(
			Arc::new(FilePluginStorage::new(dir.path())),
			CacheConfig::default(),
		);
		restarted.load().await.unwrap();
		assert_eq!(restarted.get_header(100).await, Some(header(1)));
		assert_eq!(restarted.height().await, 100);
	}

	#[tokio::test]
	async fn test_corrupt_file_only_empties_that_cache() {
		let storage = Arc::new(MemoryPluginStorage::new());
		storage.write("headers.json", "{not json").await.unwrap();
		storage
			.write(
				"serverCache.json",
				r#"{"servers":[{"url":"electrum://x:1","score":3,"futureField":true}]}"#,
			)
			.await
			.unwrap();

		let cache = cache_over(storage, CacheConfig::default());
		cache.load().await.unwrap();
		assert_eq!(cache.height().await, 0);
		let servers = cache.get_servers().await;
		assert_eq!(servers.len(), 1);
		assert_eq!(servers[0].score, 3);
	}

	#[tokio::test]
	async fn test_required_corrupt_file_fails_load() {
		let storage = Arc::new(MemoryPluginStorage::new());
		storage.write("headers.json", "{\"headers\": 5").await.unwrap();
		let config = CacheConfig {
			headers_required: true,
			..CacheConfig::default()
		};
		let cache = cache_over(storage, config);
		assert!(matches!(
			cache.load().await,
			Err(CacheError::Corrupt { .. })
		));
	}

	#[tokio::test]
	async fn test_required_missing_file_is_empty() {
		let config = CacheConfig {
			headers_required: true,
			servers_required: true,
			..CacheConfig::default()
		};
		let cache = cache_over(Arc::new(MemoryPluginStorage::new()), config);
		cache.load().await.unwrap();
		assert!(cache.get_servers().await.is_empty());
	}

	#[tokio::test]
	async fn test_settings_overlay() {
		let cache = PluginStateCache::new(
			"litecoin",
			Arc::new(MemoryPluginStorage::new()),
			CacheConfig::default(),
			defaults(),
			json!({"infoServer": "https://mine", "unknownKey": 1}),
			Span::none(),
		);
		cache.load().await.unwrap();
		let settings = cache.settings().await;
		assert_eq!(settings.info_server, "https://mine");
		assert_eq!(settings.electrum_servers, vec!["electrum://a:50001".to_string()]);
		assert!(cache.raw_settings().await.get("unknownKey").is_none());
	}

	#[tokio::test]
	async fn test_mistyped_override_falls_back_to_defaults() {
		let cache = PluginStateCache::new(
			"litecoin",
			Arc::new(MemoryPluginStorage::new()),
			CacheConfig::default(),
			defaults(),
			json!({"electrumServers": 12}),
			Span::none(),
		);
		cache.load().await.unwrap();
		assert_eq!(cache.settings().await.electrum_servers.len(), 1);
	}

	#[tokio::test]
	async fn test_mutation_schedules_flush() {
		let storage = Arc::new(MemoryPluginStorage::new());
		let config = CacheConfig {
			save_delay: Duration::from_millis(20),
			..CacheConfig::default()
		};
		let cache = cache_over(storage.clone(), config);
		cache.load().await.unwrap();
		cache
			.put_servers(vec![ServerInfo::new("electrum://y:2")])
			.await;
		assert_eq!(storage.read("serverCache.json").await.unwrap(), None);

		tokio::time::sleep(Duration::from_millis(200)).await;
		let written = storage.read("serverCache.json").await.unwrap().unwrap();
		assert!(written.contains("electrum://y:2"));
	}

	#[tokio::test]
	async fn test_shutdown_saves_immediately() {
		let storage = Arc::new(MemoryPluginStorage::new());
		let cache = cache_over(storage.clone(), CacheConfig::default());
		cache.load().await.unwrap();
		cache.put_header(7, header(7)).await;
		cache.shutdown().await.unwrap();
		let written = storage.read("headers.json").await.unwrap().unwrap();
		let parsed: HeaderFile = serde_json::from_str(&written).unwrap();
		assert_eq!(parsed.height, 7);
		assert_eq!(parsed.headers.get(&7), Some(&header(7)));
	}

	/// Memory storage whose writes take a while, so flushes overlap mutations.
	struct SlowStorage {
		inner: MemoryPluginStorage,
		write_delay: Duration,
	}

	#[async_trait::async_trait]
	impl PluginStorage for SlowStorage {
		async fn read(&self, name: &str) -> Result<Option<String>, CacheError> {
			self.inner.read(name).await
		}

		async fn write(&self, name: &str, contents: &str) -> Result<(), CacheError> {
			tokio::time::sleep(self.write_delay).await;
			self.inner.write(name, contents).await
		}
	}

	fn slow_storage(write_delay: Duration) -> Arc<SlowStorage> {
		Arc::new(SlowStorage {
			inner: MemoryPluginStorage::new(),
			write_delay,
		})
	}

	async fn stored_headers(storage: &dyn PluginStorage) -> HeaderFile {
		let written = storage.read("headers.json").await.unwrap().unwrap();
		serde_json::from_str(&written).unwrap()
	}

	#[tokio::test]
	async fn test_mutation_during_flush_is_flushed_later() {
		let storage = slow_storage(Duration::from_millis(100));
		let config = CacheConfig {
			save_delay: Duration::from_millis(10),
			..CacheConfig::default()
		};
		let cache = cache_over(storage.clone(), config);
		cache.load().await.unwrap();

		cache.put_header(1, header(1)).await;
		// the first flush is now inside its header write
		tokio::time::sleep(Duration::from_millis(50)).await;
		cache.put_header(2, header(2)).await;

		tokio::time::sleep(Duration::from_millis(1000)).await;
		let stored = stored_headers(storage.as_ref()).await;
		assert_eq!(stored.height, 2);
		assert_eq!(stored.headers.get(&2), Some(&header(2)));
		assert!(cache.inner.pending_flush.lock().await.is_none());
	}

	#[tokio::test]
	async fn test_save_alongside_mutations_keeps_latest() {
		let storage = slow_storage(Duration::from_millis(5));
		let config = CacheConfig {
			save_delay: Duration::from_millis(1),
			..CacheConfig::default()
		};
		let cache = cache_over(storage.clone(), config);
		cache.load().await.unwrap();

		let writers = (1..=20u8).map(|n| {
			let cache = cache.clone();
			async move {
				cache.put_header(n as u64, header(n)).await;
				cache
					.put_servers(vec![ServerInfo::new(format!("electrum://s{}:1", n))])
					.await;
				cache.save().await.unwrap();
			}
		});
		futures::future::join_all(writers).await;
		cache.save().await.unwrap();

		let stored = stored_headers(storage.as_ref()).await;
		assert_eq!(stored.headers.len(), 20);
		assert_eq!(stored.height, 20);
		let servers: ServerFile =
			serde_json::from_str(&storage.read("serverCache.json").await.unwrap().unwrap()).unwrap();
		assert_eq!(servers.servers, cache.get_servers().await);
	}

	#[tokio::test]
	async fn test_shutdown_waits_for_flush_in_progress() {
		let storage = slow_storage(Duration::from_millis(100));
		let config = CacheConfig {
			save_delay: Duration::from_millis(10),
			..CacheConfig::default()
		};
		let cache = cache_over(storage.clone(), config);
		cache.load().await.unwrap();

		cache.put_header(1, header(1)).await;
		tokio::time::sleep(Duration::from_millis(50)).await;
		cache.put_header(2, header(2)).await;
		cache.shutdown().await.unwrap();

		let stored = stored_headers(storage.as_ref()).await;
		assert_eq!(stored.height, 2);
		assert!(cache.inner.pending_flush.lock().await.is_none());
	}

	#[tokio::test]
	async fn test_shutdown_cancels_sleeping_flush() {
		let storage = Arc::new(MemoryPluginStorage::new());
		let config = CacheConfig {
			save_delay: Duration::from_secs(60),
			..CacheConfig::default()
		};
		let cache = cache_over(storage.clone(), config);
		cache.load().await.unwrap();
		cache.put_header(3, header(3)).await;

		tokio::time::timeout(Duration::from_secs(5), cache.shutdown())
			.await
			.unwrap()
			.unwrap();
		assert_eq!(stored_headers(storage.as_ref()).await.height, 3);
	}

	#[tokio::test]
	async fn test_concurrent_file_saves_leave_no_staging_files() {
		let dir = tempfile::tempdir().unwrap();
		let config = CacheConfig {
			save_delay: Duration::from_millis(1),
			..CacheConfig::default()
		};
		let cache = cache_over(Arc::new(FilePluginStorage::new(dir.path())), config);
		cache.load().await.unwrap();

		let writers = (1..=10u8).map(|n| {
			let cache = cache.clone();
			async move {
				cache.put_header(n as u64, header(n)).await;
				cache.save().await.unwrap();
			}
		});
		futures::future::join_all(writers).await;
		cache.shutdown().await.unwrap();

		let leftovers: Vec<_> = std::fs::read_dir(dir.path())
			.unwrap()
			.map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
			.filter(|name| name.ends_with(".tmp"))
			.collect();
		assert!(leftovers.is_empty(), "{:?}", leftovers);

		let restarted = cache_over(
			Arc::new(FilePluginStorage::new(dir.path())),
			CacheConfig::default(),
		);
		restarted.load().await.unwrap();
		assert_eq!(restarted.height().await, 10);
	}
}
