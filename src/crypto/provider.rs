//! Capabilities the host injects into the plugin.
//!
//! The plugin never performs elliptic-curve arithmetic or key stretching
//! itself; it calls through these traits so a host can substitute hardware
//! backed or faster implementations.

use crate::crypto::types::CryptoError;

/// Elliptic-curve and key-stretching primitives.
#[async_trait::async_trait]
pub trait CryptoProvider: Send + Sync {
	/// Compressed secp256k1 public key for a secret scalar.
	async fn public_key_create(&self, secret: &[u8; 32]) -> Result<[u8; 33], CryptoError>;

	/// `(secret + tweak) mod n`
	async fn private_key_tweak_add(
		&self,
		secret: &[u8; 32],
		tweak: &[u8; 32],
	) -> Result<[u8; 32], CryptoError>;

	/// `public + tweak*G`, compressed.
	async fn public_key_tweak_add(
		&self,
		public: &[u8; 33],
		tweak: &[u8; 32],
	) -> Result<[u8; 33], CryptoError>;

	/// PBKDF2 with HMAC-SHA512.
	async fn pbkdf2_sha512(
		&self,
		password: &[u8],
		salt: &[u8],
		iterations: u32,
		length: usize,
	) -> Result<Vec<u8>, CryptoError>;
}

/// Source of cryptographically secure random bytes.
#[async_trait::async_trait]
pub trait RandomSource: Send + Sync {
	async fn random_bytes(&self, length: usize) -> Result<Vec<u8>, CryptoError>;
}
