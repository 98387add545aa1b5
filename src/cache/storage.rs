//! Storage backends for the plugin cache files.

use crate::cache::types::CacheError;

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Named-file storage scoped to one plugin.
#[async_trait::async_trait]
pub trait PluginStorage: Send + Sync {
	/// Contents of `name`, or `None` when it does not exist.
	async fn read(&self, name: &str) -> Result<Option<String>, CacheError>;

	/// Replace `name`. A failed write must leave the previous contents intact.
	async fn write(&self, name: &str, contents: &str) -> Result<(), CacheError>;
}

/// Files in a per-plugin directory. Use one instance per directory; staging
/// names are only unique within an instance.
pub struct FilePluginStorage {
	dir: PathBuf,
	staging_seq: AtomicU64,
}

impl FilePluginStorage {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self {
			dir: dir.into(),
			staging_seq: AtomicU64::new(0),
		}
	}

	async fn write_staged(
		&self,
		staging: &Path,
		target: &Path,
		contents: &str,
	) -> std::io::Result<()> {
		let mut file = tokio::fs::File::create(staging).await?;
		file.write_all(contents.as_bytes()).await?;
		file.sync_all().await?;
		drop(file);
		tokio::fs::rename(staging, target).await
	}
}

#[async_trait::async_trait]
impl PluginStorage for FilePluginStorage {
	async fn read(&self, name: &str) -> Result<Option<String>, CacheError> {
		match tokio::fs::read_to_string(self.dir.join(name)).await {
			Ok(contents) => Ok(Some(contents)),
			Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
			Err(e) => Err(CacheError::Read {
				file: name.to_string(),
				reason: e.to_string(),
			}),
		}
	}

	async fn write(&self, name: &str, contents: &str) -> Result<(), CacheError> {
		let write_err = |e: std::io::Error| CacheError::Write {
			file: name.to_string(),
			reason: e.to_string(),
		};
		tokio::fs::create_dir_all(&self.dir).await.map_err(write_err)?;

		// Write a sibling file and rename it over the target so readers see
		// either the old or the new contents. Concurrent writers never share
		// a staging file.
		let target = self.dir.join(name);
		let seq = self.staging_seq.fetch_add(1, Ordering::Relaxed);
		let staging = self.dir.join(format!("{}.{}.tmp", name, seq));
		if let Err(e) = self.write_staged(&staging, &target, contents).await {
			if let Err(cleanup) = tokio::fs::remove_file(&staging).await {
				if cleanup.kind() != ErrorKind::NotFound {
					warn!("Could not remove {:?}: {}", staging, cleanup);
				}
			}
			return Err(write_err(e));
		}

		debug!("Wrote {:?} ({} bytes)", target, contents.len());
		Ok(())
	}
}

/// In-memory storage for hosts without a filesystem.
#[derive(Default)]
pub struct MemoryPluginStorage {
	files: Mutex<HashMap<String, String>>,
}

impl MemoryPluginStorage {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait::async_trait]
impl PluginStorage for MemoryPluginStorage {
	async fn read(&self, name: &str) -> Result<Option<String>, CacheError> {
		Ok(self.files.lock().await.get(name).cloned())
	}

	async fn write(&self, name: &str, contents: &str) -> Result<(), CacheError> {
		self.files
			.lock()
			.await
			.insert(name.to_string(), contents.to_string());
		Ok(())
	}
}
