//! Payment URI codec.

pub mod codec;
pub mod types;

pub use codec::{UriCodec, encode_uri, parse_uri};
pub use types::*;
