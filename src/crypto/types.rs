use thiserror::Error;

/// Failures reported by the injected crypto and randomness capabilities
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CryptoError {
	#[error("Invalid secret key: {0}")]
	InvalidSecretKey(String),

	#[error("Invalid public key: {0}")]
	InvalidPublicKey(String),

	#[error("Invalid tweak: {0}")]
	InvalidTweak(String),

	#[error("Randomness unavailable: {0}")]
	Random(String),

	#[error("Encoding error: {0}")]
	Encoding(String),
}
