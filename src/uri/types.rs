use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UriError {
	#[error("Malformed URI: {0}")]
	MalformedUri(String),

	#[error("Invalid address {address}: {reason}")]
	InvalidAddress { address: String, reason: String },
}

/// The logical content of a payment URI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
	pub public_address: String,
	/// Amount in base units (satoshis)
	#[serde(default)]
	pub native_amount: Option<u64>,
	#[serde(default)]
	pub label: Option<String>,
	#[serde(default)]
	pub message: Option<String>,
}

impl PaymentRequest {
	pub fn new(public_address: impl Into<String>) -> Self {
		Self {
			public_address: public_address.into(),
			..Self::default()
		}
	}
}
