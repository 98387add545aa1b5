use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Cache errors carry rendered messages so a failed load can be shared
/// with every caller waiting on the same tools construction.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
	#[error("Failed to read {file}: {reason}")]
	Read { file: String, reason: String },

	#[error("Corrupt cache file {file}: {reason}")]
	Corrupt { file: String, reason: String },

	#[error("Failed to write {file}: {reason}")]
	Write { file: String, reason: String },

	#[error("Serialization error: {0}")]
	Serialize(String),

	#[error("Invalid settings: {0}")]
	Settings(String),
}

/// Validated header data stored per block height.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeader {
	/// Block hash, hex
	pub hash: String,
	#[serde(default)]
	pub prev_hash: Option<String>,
	#[serde(default)]
	pub timestamp: u32,
}

/// A known endpoint with health metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
	pub url: String,
	/// Higher is better
	#[serde(default)]
	pub score: i64,
	#[serde(default)]
	pub response_time_ms: Option<u64>,
	/// Unix seconds of the last successful connection
	#[serde(default)]
	pub last_connected: Option<i64>,
}

impl ServerInfo {
	pub fn new(url: impl Into<String>) -> Self {
		Self {
			url: url.into(),
			score: 0,
			response_time_ms: None,
			last_connected: None,
		}
	}
}

/// On-disk layout of the header cache.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HeaderFile {
	#[serde(default)]
	pub height: u64,
	#[serde(default)]
	pub headers: BTreeMap<u64, BlockHeader>,
	#[serde(default)]
	pub saved_at: Option<String>,
}

/// On-disk layout of the server cache.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ServerFile {
	#[serde(default)]
	pub servers: Vec<ServerInfo>,
	#[serde(default)]
	pub saved_at: Option<String>,
}

/// Configuration for the plugin state cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
	pub headers_file: String,
	pub servers_file: String,
	/// A required file that exists but cannot be read fails the load
	pub headers_required: bool,
	pub servers_required: bool,
	/// Delay between the first mutation and the flush it schedules
	pub save_delay: Duration,
}

impl Default for CacheConfig {
	fn default() -> Self {
		Self {
			headers_file: "headers.json".to_string(),
			servers_file: "serverCache.json".to_string(),
			headers_required: false,
			servers_required: false,
			save_delay: Duration::from_secs(5),
		}
	}
}

/// Typed view of the effective plugin settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PluginSettings {
	pub electrum_servers: Vec<String>,
	pub info_server: String,
	pub fee_info_server: String,
	pub disable_fetching_servers: bool,
}
