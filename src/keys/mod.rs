//! HD key derivation for the supported forks.

/// Seed handling, xpub derivation, fork splitting and addresses
pub mod derivation;
/// BIP32 extended key codec
pub mod extended;
/// Key bundle, wallet record and error types
pub mod types;

pub use derivation::KeyDerivation;
pub use extended::{ExtendedKey, HARDENED, KeyData};
pub use types::*;
