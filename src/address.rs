//! Address encoding and validation for Bitcoin-derived networks.
//!
//! Legacy and script addresses use Base58Check with the network's version
//! bytes. Native segwit (v0) addresses use bech32 with the network's
//! human-readable prefix.

use crate::crypto::hash::{check_decode, check_encode, hash160};
use crate::network::NetworkParameters;

use bech32::Hrp;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
	#[error("Base58Check decoding failed: {0}")]
	Encoding(String),
	#[error("Unexpected version byte 0x{0:02x}")]
	UnknownVersion(u8),
	#[error("Unexpected payload length {0}")]
	InvalidLength(usize),
	#[error("Bech32 prefix '{found}' does not match '{expected}'")]
	PrefixMismatch { expected: String, found: String },
	#[error("Bech32 error: {0}")]
	Bech32(String),
	#[error("Network has no segwit support")]
	SegwitUnsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
	/// Pay to public key hash
	P2pkh,
	/// Pay to script hash, including nested segwit
	P2sh,
	/// Native segwit v0 key hash
	P2wpkh,
	/// Native segwit v0 script hash
	P2wsh,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
	pub kind: AddressKind,
	/// 20-byte hash for key/script hash variants, 32 bytes for P2WSH
	pub hash: Vec<u8>,
}

impl Address {
	pub fn p2pkh(public_key: &[u8; 33]) -> Self {
		Self {
			kind: AddressKind::P2pkh,
			hash: hash160(public_key).to_vec(),
		}
	}

	/// P2WPKH wrapped in P2SH (BIP49).
	pub fn p2sh_p2wpkh(public_key: &[u8; 33]) -> Self {
		let mut redeem_script = Vec::with_capacity(22);
		redeem_script.push(0x00);
		redeem_script.push(0x14);
		redeem_script.extend_from_slice(&hash160(public_key));
		Self {
			kind: AddressKind::P2sh,
			hash: hash160(&redeem_script).to_vec(),
		}
	}

	pub fn p2wpkh(public_key: &[u8; 33]) -> Self {
		Self {
			kind: AddressKind::P2wpkh,
			hash: hash160(public_key).to_vec(),
		}
	}

	pub fn encode(&self, params: &NetworkParameters) -> Result<String, AddressError> {
		let prefix = &params.address_prefix;
		match self.kind {
			AddressKind::P2pkh | AddressKind::P2sh => {
				if self.hash.len() != 20 {
					return Err(AddressError::InvalidLength(self.hash.len()));
				}
				let version = if self.kind == AddressKind::P2pkh {
					prefix.pubkeyhash
				} else {
					prefix.scripthash
				};
				let mut payload = Vec::with_capacity(21);
				payload.push(version);
				payload.extend_from_slice(&self.hash);
				Ok(check_encode(&payload))
			}
			AddressKind::P2wpkh | AddressKind::P2wsh => {
				let hrp = prefix
					.bech32
					.as_deref()
					.ok_or(AddressError::SegwitUnsupported)?;
				let hrp = Hrp::parse(hrp).map_err(|e| AddressError::Bech32(e.to_string()))?;
				bech32::segwit::encode_v0(hrp, &self.hash)
					.map_err(|e| AddressError::Bech32(e.to_string()))
			}
		}
	}

	/// Parse and validate an address against a network's formats.
	pub fn decode(address: &str, params: &NetworkParameters) -> Result<Self, AddressError> {
		if let Some(hrp) = params.address_prefix.bech32.as_deref() {
			if address.to_lowercase().starts_with(&format!("{}1", hrp)) {
				return Self::decode_segwit(address, hrp);
			}
		}

		let payload = check_decode(address).map_err(|e| AddressError::Encoding(e.to_string()))?;
		if payload.len() != 21 {
			return Err(AddressError::InvalidLength(payload.len()));
		}
		let version = payload[0];
		let prefix = &params.address_prefix;
		let legacy = &params.legacy_address_prefix;
		let kind = if version == prefix.pubkeyhash || legacy.pubkeyhash == Some(version) {
			AddressKind::P2pkh
		} else if version == prefix.scripthash || legacy.scripthash == Some(version) {
			AddressKind::P2sh
		} else {
			return Err(AddressError::UnknownVersion(version));
		};

		Ok(Self {
			kind,
			hash: payload[1..].to_vec(),
		})
	}

	fn decode_segwit(address: &str, expected_hrp: &str) -> Result<Self, AddressError> {
		let (hrp, version, program) =
			bech32::segwit::decode(address).map_err(|e| AddressError::Bech32(e.to_string()))?;
		let found = hrp.to_lowercase();
		if found != expected_hrp {
			return Err(AddressError::PrefixMismatch {
				expected: expected_hrp.to_string(),
				found,
			});
		}
		if version != bech32::segwit::VERSION_0 {
			return Err(AddressError::Bech32(format!(
				"unsupported witness version {}",
				version.to_u8()
			)));
		}
		let kind = match program.len() {
			20 => AddressKind::P2wpkh,
			32 => AddressKind::P2wsh,
			other => return Err(AddressError::InvalidLength(other)),
		};
		Ok(Self {
			kind,
			hash: program,
		})
	}
}
