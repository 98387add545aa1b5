//! Types describing the consensus and address constants of a single fork.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the network registry
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NetworkError {
	#[error("Unknown network: {0}")]
	UnknownNetwork(String),

	#[error("Network already registered: {0}")]
	DuplicateNetwork(String),

	#[error("Network {network} lists unknown fork {fork}")]
	InvalidForkReference { network: String, fork: String },
}

/// Version bytes for private keys and extended keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPrefix {
	/// WIF private key version byte
	pub privkey: u8,
	/// Extended public key version
	pub xpubkey: u32,
	/// Extended private key version
	pub xprivkey: u32,
	/// Base58 prefix produced by `xpubkey`, e.g. "xpub"
	pub xpubkey58: String,
	/// Base58 prefix produced by `xprivkey`, e.g. "xprv"
	pub xprivkey58: String,
	/// BIP44 coin type index
	pub coin_type: u32,
}

/// Address version bytes for the formats a network accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressPrefix {
	pub pubkeyhash: u8,
	pub scripthash: u8,
	#[serde(default)]
	pub witnesspubkeyhash: Option<u8>,
	#[serde(default)]
	pub witnessscripthash: Option<u8>,
	/// Human-readable part for native segwit addresses
	#[serde(default)]
	pub bech32: Option<String>,
}

/// Version bytes still accepted from before a network changed its prefixes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyAddressPrefix {
	#[serde(default)]
	pub pubkeyhash: Option<u8>,
	#[serde(default)]
	pub scripthash: Option<u8>,
}

/// Immutable per-fork parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkParameters {
	/// Protocol network identifier
	pub magic: u32,
	/// BIP derivation standards, in order of preference
	pub supported_bips: Vec<u32>,
	pub key_prefix: KeyPrefix,
	pub address_prefix: AddressPrefix,
	#[serde(default)]
	pub legacy_address_prefix: LegacyAddressPrefix,
	/// Networks that accept keys derived for this one
	#[serde(default)]
	pub forks: Vec<String>,
}

impl NetworkParameters {
	pub fn supports_bip(&self, bip: u32) -> bool {
		self.supported_bips.contains(&bip)
	}

	/// The lowest-numbered BIP standard this network supports.
	pub fn default_bip(&self) -> Option<u32> {
		self.supported_bips.iter().copied().min()
	}
}
