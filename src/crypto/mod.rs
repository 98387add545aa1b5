//! Cryptographic capabilities and encoding helpers.
//!
//! Elliptic-curve math, key stretching and randomness come from the host
//! through [`CryptoProvider`] and [`RandomSource`]. [`NativeCrypto`] and
//! [`OsRandom`] are the defaults for hosts that have nothing better to offer.

pub mod hash;
pub mod native;
pub mod provider;
pub mod types;

pub use native::{NativeCrypto, OsRandom};
pub use provider::{CryptoProvider, RandomSource};
pub use types::CryptoError;
