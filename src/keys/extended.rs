//! BIP32 extended keys.
//!
//! Curve arithmetic is delegated to the injected [`CryptoProvider`]; this
//! module only handles the HMAC chain, fingerprints and the 78-byte
//! serialization with network version bytes.

use crate::crypto::hash::{check_decode, check_encode, hash160, hmac_sha512};
use crate::crypto::CryptoProvider;
use crate::keys::types::KeyError;
use crate::network::NetworkParameters;

/// Indices at or above this value derive hardened children.
pub const HARDENED: u32 = 0x8000_0000;

const SERIALIZED_LEN: usize = 78;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyData {
	Private([u8; 32]),
	Public([u8; 33]),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedKey {
	pub depth: u8,
	pub parent_fingerprint: [u8; 4],
	pub child_number: u32,
	pub chain_code: [u8; 32],
	pub key: KeyData,
}

fn split_hmac(i: [u8; 64]) -> ([u8; 32], [u8; 32]) {
	let mut left = [0u8; 32];
	let mut right = [0u8; 32];
	left.copy_from_slice(&i[..32]);
	right.copy_from_slice(&i[32..]);
	(left, right)
}

impl ExtendedKey {
	/// Master key from seed bytes (`HMAC-SHA512("Bitcoin seed", seed)`).
	pub async fn from_seed(seed: &[u8], crypto: &dyn CryptoProvider) -> Result<Self, KeyError> {
		if !(16..=64).contains(&seed.len()) {
			return Err(KeyError::InvalidSeed(format!(
				"seed must be 16 to 64 bytes, got {}",
				seed.len()
			)));
		}
		let (secret, chain_code) = split_hmac(hmac_sha512(b"Bitcoin seed", seed)?);
		// Rejects a zero or out-of-range master secret.
		crypto.public_key_create(&secret).await?;
		Ok(Self {
			depth: 0,
			parent_fingerprint: [0; 4],
			child_number: 0,
			chain_code,
			key: KeyData::Private(secret),
		})
	}

	pub fn is_private(&self) -> bool {
		matches!(self.key, KeyData::Private(_))
	}

	pub async fn public_key(&self, crypto: &dyn CryptoProvider) -> Result<[u8; 33], KeyError> {
		match &self.key {
			KeyData::Private(secret) => Ok(crypto.public_key_create(secret).await?),
			KeyData::Public(public) => Ok(*public),
		}
	}

	/// Drop the private half.
	pub async fn neutered(&self, crypto: &dyn CryptoProvider) -> Result<Self, KeyError> {
		Ok(Self {
			key: KeyData::Public(self.public_key(crypto).await?),
			..self.clone()
		})
	}

	pub async fn fingerprint(&self, crypto: &dyn CryptoProvider) -> Result<[u8; 4], KeyError> {
		let hash = hash160(&self.public_key(crypto).await?);
		Ok([hash[0], hash[1], hash[2], hash[3]])
	}

	/// CKDpriv for private keys, CKDpub for public keys.
	pub async fn derive_child(
		&self,
		index: u32,
		crypto: &dyn CryptoProvider,
	) -> Result<Self, KeyError> {
		let public = self.public_key(crypto).await?;
		let mut data = Vec::with_capacity(37);
		match &self.key {
			KeyData::Private(secret) if index >= HARDENED => {
				data.push(0);
				data.extend_from_slice(secret);
			}
			KeyData::Public(_) if index >= HARDENED => {
				return Err(KeyError::InvalidExtendedKey(
					"cannot derive a hardened child from a public key".to_string(),
				));
			}
			_ => data.extend_from_slice(&public),
		}
		data.extend_from_slice(&index.to_be_bytes());

		let (tweak, chain_code) = split_hmac(hmac_sha512(&self.chain_code, &data)?);
		let key = match &self.key {
			KeyData::Private(secret) => {
				KeyData::Private(crypto.private_key_tweak_add(secret, &tweak).await?)
			}
			KeyData::Public(public) => {
				KeyData::Public(crypto.public_key_tweak_add(public, &tweak).await?)
			}
		};
		let hash = hash160(&public);

		Ok(Self {
			depth: self.depth.checked_add(1).ok_or_else(|| {
				KeyError::InvalidExtendedKey("maximum depth exceeded".to_string())
			})?,
			parent_fingerprint: [hash[0], hash[1], hash[2], hash[3]],
			child_number: index,
			chain_code,
			key,
		})
	}

	pub async fn derive_path(
		&self,
		path: &[u32],
		crypto: &dyn CryptoProvider,
	) -> Result<Self, KeyError> {
		let mut key = self.clone();
		for index in path {
			key = key.derive_child(*index, crypto).await?;
		}
		Ok(key)
	}

	/// Base58Check serialization using the network's version bytes.
	pub fn to_base58(&self, params: &NetworkParameters) -> String {
		let mut out = Vec::with_capacity(SERIALIZED_LEN);
		let version = match self.key {
			KeyData::Private(_) => params.key_prefix.xprivkey,
			KeyData::Public(_) => params.key_prefix.xpubkey,
		};
		out.extend_from_slice(&version.to_be_bytes());
		out.push(self.depth);
		out.extend_from_slice(&self.parent_fingerprint);
		out.extend_from_slice(&self.child_number.to_be_bytes());
		out.extend_from_slice(&self.chain_code);
		match &self.key {
			KeyData::Private(secret) => {
				out.push(0);
				out.extend_from_slice(secret);
			}
			KeyData::Public(public) => out.extend_from_slice(public),
		}
		check_encode(&out)
	}

	pub fn from_base58(encoded: &str, params: &NetworkParameters) -> Result<Self, KeyError> {
		let data =
			check_decode(encoded).map_err(|e| KeyError::InvalidExtendedKey(e.to_string()))?;
		if data.len() != SERIALIZED_LEN {
			return Err(KeyError::InvalidExtendedKey(format!(
				"expected {} bytes, got {}",
				SERIALIZED_LEN,
				data.len()
			)));
		}
		let version = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
		let mut chain_code = [0u8; 32];
		chain_code.copy_from_slice(&data[13..45]);

		let key = if version == params.key_prefix.xprivkey {
			if data[45] != 0 {
				return Err(KeyError::InvalidExtendedKey(
					"private key data must start with 0x00".to_string(),
				));
			}
			let mut secret = [0u8; 32];
			secret.copy_from_slice(&data[46..]);
			KeyData::Private(secret)
		} else if version == params.key_prefix.xpubkey {
			let mut public = [0u8; 33];
			public.copy_from_slice(&data[45..]);
			KeyData::Public(public)
		} else {
			return Err(KeyError::InvalidExtendedKey(format!(
				"version 0x{:08x} does not belong to this network",
				version
			)));
		};

		Ok(Self {
			depth: data[4],
			parent_fingerprint: [data[5], data[6], data[7], data[8]],
			child_number: u32::from_be_bytes([data[9], data[10], data[11], data[12]]),
			chain_code,
			key,
		})
	}
}
