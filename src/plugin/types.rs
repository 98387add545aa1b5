use crate::cache::CacheError;
use crate::keys::KeyError;
use crate::network::NetworkError;
use crate::uri::UriError;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by the plugin entry points
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PluginError {
	#[error(transparent)]
	Network(#[from] NetworkError),

	#[error(transparent)]
	Key(#[from] KeyError),

	#[error(transparent)]
	Uri(#[from] UriError),

	#[error("Plugin cache unavailable: {0}")]
	Cache(#[from] CacheError),

	#[error("Engine error: {0}")]
	Engine(String),
}

impl From<tokio::task::JoinError> for PluginError {
	fn from(e: tokio::task::JoinError) -> Self {
		PluginError::Engine(format!("Tools construction did not finish: {}", e))
	}
}

/// Host options passed when creating an engine for one wallet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineOptions {
	/// Per-wallet settings the host wants applied
	#[serde(default)]
	pub user_settings: serde_json::Value,
	/// Gap limit for address discovery
	#[serde(default)]
	pub gap_limit: Option<u32>,
}
