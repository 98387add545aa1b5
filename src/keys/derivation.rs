//! Key derivation service.
//!
//! Turns host randomness or stored seeds into network specific key bundles,
//! extended public keys and receive addresses. Every operation validates its
//! inputs completely before deriving anything, so a failure never leaves a
//! half-built bundle behind.

use crate::address::Address;
use crate::crypto::{CryptoProvider, RandomSource};
use crate::keys::extended::{ExtendedKey, HARDENED};
use crate::keys::types::{BipFormat, CreatePrivateKeyOptions, KeyError, WalletKeyMaterial};
use crate::network::{NetworkParameters, NetworkRegistry};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bip39::{Language, Mnemonic};
use std::sync::Arc;
use tracing::debug;

const ENTROPY_BYTES: usize = 32;
const MNEMONIC_ITERATIONS: u32 = 2048;
const SEED_BYTES: usize = 64;

#[derive(Clone)]
pub struct KeyDerivation {
	registry: Arc<NetworkRegistry>,
	crypto: Arc<dyn CryptoProvider>,
}

impl KeyDerivation {
	pub fn new(registry: Arc<NetworkRegistry>, crypto: Arc<dyn CryptoProvider>) -> Self {
		Self { registry, crypto }
	}

	fn resolve_format(
		params: &NetworkParameters,
		network: &str,
		tag: Option<&str>,
	) -> Result<BipFormat, KeyError> {
		let format = match tag {
			Some(tag) => BipFormat::parse(tag, network)?,
			None => params
				.default_bip()
				.map(BipFormat)
				.unwrap_or(BipFormat::BIP32),
		};
		if !params.supports_bip(format.0) {
			return Err(KeyError::UnsupportedFormat {
				format: format.to_string(),
				network: network.to_string(),
			});
		}
		Ok(format)
	}

	/// Fresh key bundle from 32 bytes of host randomness.
	///
	/// Format `bip32` stores the entropy as base64, every other format as a
	/// BIP39 mnemonic.
	pub async fn create_private_key(
		&self,
		entropy: &dyn RandomSource,
		network: &str,
		options: &CreatePrivateKeyOptions,
	) -> Result<WalletKeyMaterial, KeyError> {
		let params = self.registry.lookup(network)?;
		let format = Self::resolve_format(params, network, options.format.as_deref())?;
		let coin_type = options.coin_type.unwrap_or(params.key_prefix.coin_type);

		let random = entropy.random_bytes(ENTROPY_BYTES).await?;
		if random.len() != ENTROPY_BYTES {
			return Err(KeyError::InvalidSeed(format!(
				"expected {} random bytes, got {}",
				ENTROPY_BYTES,
				random.len()
			)));
		}
		let seed = if format == BipFormat::BIP32 {
			BASE64.encode(&random)
		} else {
			Mnemonic::from_entropy_in(Language::English, &random)
				.map_err(|e| KeyError::InvalidSeed(e.to_string()))?
				.to_string()
		};

		debug!("Created {} key for {}", format, network);
		let mut keys = WalletKeyMaterial::new();
		keys.insert(WalletKeyMaterial::seed_field(network), seed);
		keys.insert(WalletKeyMaterial::FORMAT, format.to_string());
		keys.insert(WalletKeyMaterial::COIN_TYPE, coin_type.to_string());
		Ok(keys)
	}

	/// Canonical hex form of a stored seed.
	///
	/// Accepts a BIP39 mnemonic, raw hex, or base64 (legacy `bip32` wallets).
	pub async fn seed_to_hex(&self, seed: &str) -> Result<String, KeyError> {
		let seed = seed.trim();
		if seed.split_whitespace().count() > 1 {
			let mnemonic = Mnemonic::parse_in_normalized(Language::English, seed)
				.map_err(|e| KeyError::InvalidSeed(e.to_string()))?;
			let bytes = self
				.crypto
				.pbkdf2_sha512(
					mnemonic.to_string().as_bytes(),
					b"mnemonic",
					MNEMONIC_ITERATIONS,
					SEED_BYTES,
				)
				.await?;
			return Ok(hex::encode(bytes));
		}
		if let Ok(bytes) = hex::decode(seed) {
			if !bytes.is_empty() {
				return Ok(hex::encode(bytes));
			}
		}
		BASE64
			.decode(seed)
			.map(hex::encode)
			.map_err(|_| KeyError::InvalidSeed("not a mnemonic, hex or base64 seed".to_string()))
	}

	async fn master_key(&self, keys: &WalletKeyMaterial, network: &str) -> Result<ExtendedKey, KeyError> {
		let seed = keys
			.seed(network)
			.ok_or_else(|| KeyError::MissingKey(WalletKeyMaterial::seed_field(network)))?;
		let hex_seed = self.seed_to_hex(seed).await?;
		let bytes = hex::decode(hex_seed).map_err(|e| KeyError::InvalidSeed(e.to_string()))?;
		ExtendedKey::from_seed(&bytes, self.crypto.as_ref()).await
	}

	/// Add `<network>Xpub` (the master extended public key) to the bundle.
	///
	/// Existing fields are kept untouched and no private material is added.
	/// A bundle that already carries the same xpub comes back unchanged; one
	/// that carries a different xpub is rejected rather than overwritten.
	pub async fn derive_xpub(
		&self,
		keys: &WalletKeyMaterial,
		network: &str,
	) -> Result<WalletKeyMaterial, KeyError> {
		let params = self.registry.lookup(network)?;
		let master = self.master_key(keys, network).await?;
		let xpub = master
			.neutered(self.crypto.as_ref())
			.await?
			.to_base58(params);

		let field = WalletKeyMaterial::xpub_field(network);
		match keys.get(&field) {
			Some(stored) if stored == xpub => Ok(keys.clone()),
			Some(_) => Err(KeyError::XpubMismatch(field)),
			None => {
				let mut out = keys.clone();
				out.insert(field, xpub);
				Ok(out)
			}
		}
	}

	/// `wallet:<fork>` for each fork that accepts the wallet's format.
	pub fn splittable_wallet_types(
		&self,
		keys: &WalletKeyMaterial,
		network: &str,
	) -> Result<Vec<String>, KeyError> {
		let tag = keys.format().unwrap_or("bip32");
		let format = BipFormat::parse(tag, network)?;
		Ok(self
			.registry
			.forks_supporting_format(network, format.0, false)?
			.into_iter()
			.map(|fork| format!("wallet:{}", fork))
			.collect())
	}

	/// Account path for a format: `m/<bip>'/<coinType>'/0'`, or `m/0` for bip32.
	pub fn account_path(format: BipFormat, coin_type: u32) -> Vec<u32> {
		if format == BipFormat::BIP32 {
			vec![0]
		} else {
			vec![format.0 | HARDENED, coin_type | HARDENED, HARDENED]
		}
	}

	/// Receive (`change = 0`) or change (`change = 1`) address at `index`.
	pub async fn derive_address(
		&self,
		keys: &WalletKeyMaterial,
		network: &str,
		change: u32,
		index: u32,
	) -> Result<String, KeyError> {
		let params = self.registry.lookup(network)?;
		let format = Self::resolve_format(params, network, keys.format())?;
		if change >= HARDENED || index >= HARDENED {
			return Err(KeyError::InvalidExtendedKey(
				"address indices must be non-hardened".to_string(),
			));
		}
		let coin_type = keys.coin_type().unwrap_or(params.key_prefix.coin_type);

		let crypto = self.crypto.as_ref();
		let account = self
			.master_key(keys, network)
			.await?
			.derive_path(&Self::account_path(format, coin_type), crypto)
			.await?;
		let public = account
			.derive_path(&[change, index], crypto)
			.await?
			.public_key(crypto)
			.await?;

		let address = match format {
			BipFormat::BIP84 => Address::p2wpkh(&public),
			BipFormat::BIP49 => Address::p2sh_p2wpkh(&public),
			_ => Address::p2pkh(&public),
		};
		address.encode(params).map_err(|e| KeyError::UnsupportedFormat {
			format: format!("{} ({})", format, e),
			network: network.to_string(),
		})
	}
}
