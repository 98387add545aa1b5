//! Hashing and Base58Check helpers used for key and address serialization.

use crate::crypto::types::CryptoError;

use hmac::{Hmac, Mac};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256, Sha512};

pub fn sha256(data: &[u8]) -> [u8; 32] {
	Sha256::digest(data).into()
}

/// SHA-256(SHA-256(data))
pub fn sha256d(data: &[u8]) -> [u8; 32] {
	sha256(&sha256(data))
}

/// RIPEMD-160(SHA-256(data)), the hash behind P2PKH and P2WPKH outputs.
pub fn hash160(data: &[u8]) -> [u8; 20] {
	Ripemd160::digest(sha256(data)).into()
}

pub fn hmac_sha512(key: &[u8], data: &[u8]) -> Result<[u8; 64], CryptoError> {
	let mut mac = Hmac::<Sha512>::new_from_slice(key)
		.map_err(|e| CryptoError::Encoding(format!("HMAC key rejected: {}", e)))?;
	mac.update(data);
	let mut out = [0u8; 64];
	out.copy_from_slice(&mac.finalize().into_bytes());
	Ok(out)
}

/// Base58 with a 4-byte double-SHA-256 checksum appended.
pub fn check_encode(payload: &[u8]) -> String {
	let checksum = sha256d(payload);
	let mut data = Vec::with_capacity(payload.len() + 4);
	data.extend_from_slice(payload);
	data.extend_from_slice(&checksum[..4]);
	bs58::encode(data).into_string()
}

/// Decode Base58Check, returning the payload without its checksum.
pub fn check_decode(encoded: &str) -> Result<Vec<u8>, CryptoError> {
	let mut data = bs58::decode(encoded)
		.into_vec()
		.map_err(|e| CryptoError::Encoding(format!("invalid base58: {}", e)))?;
	if data.len() < 4 {
		return Err(CryptoError::Encoding("data too short for checksum".to_string()));
	}
	let checksum = data.split_off(data.len() - 4);
	if sha256d(&data)[..4] != checksum[..] {
		return Err(CryptoError::Encoding("checksum mismatch".to_string()));
	}
	Ok(data)
}
