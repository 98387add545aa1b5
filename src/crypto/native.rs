//! Default in-process implementations of the injected capabilities.

use crate::crypto::provider::{CryptoProvider, RandomSource};
use crate::crypto::types::CryptoError;

use rand::Rng;
use secp256k1::{All, PublicKey, Scalar, Secp256k1, SecretKey};
use sha2::Sha512;

/// secp256k1 + PBKDF2 backed by the `secp256k1` and `pbkdf2` crates
pub struct NativeCrypto {
	secp: Secp256k1<All>,
}

impl NativeCrypto {
	pub fn new() -> Self {
		Self {
			secp: Secp256k1::new(),
		}
	}
}

impl Default for NativeCrypto {
	fn default() -> Self {
		Self::new()
	}
}

fn secret_key(secret: &[u8; 32]) -> Result<SecretKey, CryptoError> {
	SecretKey::from_slice(secret).map_err(|e| CryptoError::InvalidSecretKey(e.to_string()))
}

fn scalar(tweak: &[u8; 32]) -> Result<Scalar, CryptoError> {
	Scalar::from_be_bytes(*tweak).map_err(|e| CryptoError::InvalidTweak(e.to_string()))
}

#[async_trait::async_trait]
impl CryptoProvider for NativeCrypto {
	async fn public_key_create(&self, secret: &[u8; 32]) -> Result<[u8; 33], CryptoError> {
		let sk = secret_key(secret)?;
		Ok(PublicKey::from_secret_key(&self.secp, &sk).serialize())
	}

	async fn private_key_tweak_add(
		&self,
		secret: &[u8; 32],
		tweak: &[u8; 32],
	) -> Result<[u8; 32], CryptoError> {
		let sk = secret_key(secret)?;
		let tweaked = sk
			.add_tweak(&scalar(tweak)?)
			.map_err(|e| CryptoError::InvalidTweak(e.to_string()))?;
		Ok(tweaked.secret_bytes())
	}

	async fn public_key_tweak_add(
		&self,
		public: &[u8; 33],
		tweak: &[u8; 32],
	) -> Result<[u8; 33], CryptoError> {
		let pk = PublicKey::from_slice(public)
			.map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
		let tweaked = pk
			.add_exp_tweak(&self.secp, &scalar(tweak)?)
			.map_err(|e| CryptoError::InvalidTweak(e.to_string()))?;
		Ok(tweaked.serialize())
	}

	async fn pbkdf2_sha512(
		&self,
		password: &[u8],
		salt: &[u8],
		iterations: u32,
		length: usize,
	) -> Result<Vec<u8>, CryptoError> {
		let mut out = vec![0u8; length];
		pbkdf2::pbkdf2_hmac::<Sha512>(password, salt, iterations, &mut out);
		Ok(out)
	}
}

/// Operating system randomness via `rand`
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandom;

#[async_trait::async_trait]
impl RandomSource for OsRandom {
	async fn random_bytes(&self, length: usize) -> Result<Vec<u8>, CryptoError> {
		let mut buf = vec![0u8; length];
		rand::rng().fill(&mut buf[..]);
		Ok(buf)
	}
}
