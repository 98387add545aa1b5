use crate::crypto::CryptoError;
use crate::network::NetworkError;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Key material errors. Raised before any field of the bundle is touched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KeyError {
	#[error("Unsupported format {format} on {network}")]
	UnsupportedFormat { format: String, network: String },

	#[error("Missing key {0}")]
	MissingKey(String),

	#[error("Invalid key name: {0}")]
	InvalidKeyName(String),

	#[error("Invalid seed: {0}")]
	InvalidSeed(String),

	#[error("Invalid extended key: {0}")]
	InvalidExtendedKey(String),

	#[error("Stored {0} does not match the one derived from the seed")]
	XpubMismatch(String),

	#[error("Derivation error: {0}")]
	Derivation(#[from] CryptoError),

	#[error(transparent)]
	Network(#[from] NetworkError),
}

/// A numbered derivation standard such as `bip44` or `bip84`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BipFormat(pub u32);

impl BipFormat {
	pub const BIP32: BipFormat = BipFormat(32);
	pub const BIP44: BipFormat = BipFormat(44);
	pub const BIP49: BipFormat = BipFormat(49);
	pub const BIP84: BipFormat = BipFormat(84);

	/// Parse a format tag of the form `bip<number>`.
	pub fn parse(tag: &str, network: &str) -> Result<Self, KeyError> {
		tag.strip_prefix("bip")
			.and_then(|n| n.parse::<u32>().ok())
			.map(BipFormat)
			.ok_or_else(|| KeyError::UnsupportedFormat {
				format: tag.to_string(),
				network: network.to_string(),
			})
	}
}

impl fmt::Display for BipFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "bip{}", self.0)
	}
}

/// Per-wallet key bundle: `<network>Key`, `<network>Xpub`, `format`, `coinType`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletKeyMaterial(BTreeMap<String, String>);

impl WalletKeyMaterial {
	pub const FORMAT: &'static str = "format";
	pub const COIN_TYPE: &'static str = "coinType";

	pub fn new() -> Self {
		Self::default()
	}

	pub fn seed_field(network: &str) -> String {
		format!("{}Key", network)
	}

	pub fn xpub_field(network: &str) -> String {
		format!("{}Xpub", network)
	}

	pub fn get(&self, field: &str) -> Option<&str> {
		self.0.get(field).map(String::as_str)
	}

	pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
		self.0.insert(field.into(), value.into());
	}

	/// The non-empty seed for `network`.
	pub fn seed(&self, network: &str) -> Option<&str> {
		self.get(&Self::seed_field(network)).filter(|s| !s.is_empty())
	}

	pub fn xpub(&self, network: &str) -> Option<&str> {
		self.get(&Self::xpub_field(network))
	}

	pub fn format(&self) -> Option<&str> {
		self.get(Self::FORMAT)
	}

	pub fn coin_type(&self) -> Option<u32> {
		self.get(Self::COIN_TYPE).and_then(|c| c.parse().ok())
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for WalletKeyMaterial {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self(
			iter.into_iter()
				.map(|(k, v)| (k.into(), v.into()))
				.collect(),
		)
	}
}

/// Host wallet record as seen by the plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletInfo {
	pub id: String,
	/// `wallet:<network>`
	#[serde(rename = "type")]
	pub wallet_type: String,
	pub keys: WalletKeyMaterial,
}

impl WalletInfo {
	pub fn wallet_type_for(network: &str) -> String {
		format!("wallet:{}", network)
	}
}

/// Options accepted by `create_private_key`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePrivateKeyOptions {
	/// Format tag, e.g. `bip84`. Defaults to the network's lowest BIP.
	#[serde(default)]
	pub format: Option<String>,
	/// Overrides the network's BIP44 coin type.
	#[serde(default)]
	pub coin_type: Option<u32>,
}
