//! Built-in fork table.

use crate::network::types::{AddressPrefix, KeyPrefix, LegacyAddressPrefix, NetworkParameters};

const XPUB: u32 = 0x0488b21e;
const XPRV: u32 = 0x0488ade4;

fn xkey_prefix(privkey: u8, coin_type: u32) -> KeyPrefix {
	KeyPrefix {
		privkey,
		xpubkey: XPUB,
		xprivkey: XPRV,
		xpubkey58: "xpub".to_string(),
		xprivkey58: "xprv".to_string(),
		coin_type,
	}
}

pub fn bitcoin() -> NetworkParameters {
	NetworkParameters {
		magic: 0xd9b4bef9,
		supported_bips: vec![84, 49, 44, 32],
		key_prefix: xkey_prefix(0x80, 0),
		address_prefix: AddressPrefix {
			pubkeyhash: 0x00,
			scripthash: 0x05,
			witnesspubkeyhash: Some(0x06),
			witnessscripthash: Some(0x0a),
			bech32: Some("bc".to_string()),
		},
		legacy_address_prefix: LegacyAddressPrefix::default(),
		forks: vec!["bitcoincash".to_string(), "bitcoingold".to_string()],
	}
}

pub fn bitcoin_testnet() -> NetworkParameters {
	NetworkParameters {
		magic: 0x0709110b,
		supported_bips: vec![84, 49, 44, 32],
		key_prefix: KeyPrefix {
			privkey: 0xef,
			xpubkey: 0x043587cf,
			xprivkey: 0x04358394,
			xpubkey58: "tpub".to_string(),
			xprivkey58: "tprv".to_string(),
			coin_type: 1,
		},
		address_prefix: AddressPrefix {
			pubkeyhash: 0x6f,
			scripthash: 0xc4,
			witnesspubkeyhash: Some(0x03),
			witnessscripthash: Some(0x28),
			bech32: Some("tb".to_string()),
		},
		legacy_address_prefix: LegacyAddressPrefix::default(),
		forks: Vec::new(),
	}
}

pub fn bitcoincash() -> NetworkParameters {
	NetworkParameters {
		magic: 0xe8f3e1e3,
		supported_bips: vec![44, 32],
		key_prefix: xkey_prefix(0x80, 145),
		address_prefix: AddressPrefix {
			pubkeyhash: 0x00,
			scripthash: 0x05,
			witnesspubkeyhash: None,
			witnessscripthash: None,
			bech32: None,
		},
		legacy_address_prefix: LegacyAddressPrefix::default(),
		forks: Vec::new(),
	}
}

pub fn bitcoingold() -> NetworkParameters {
	NetworkParameters {
		magic: 0x446d47e1,
		supported_bips: vec![84, 49, 44, 32],
		key_prefix: xkey_prefix(0x80, 156),
		address_prefix: AddressPrefix {
			pubkeyhash: 0x26,
			scripthash: 0x17,
			witnesspubkeyhash: None,
			witnessscripthash: None,
			bech32: Some("btg".to_string()),
		},
		legacy_address_prefix: LegacyAddressPrefix::default(),
		forks: Vec::new(),
	}
}

pub fn litecoin() -> NetworkParameters {
	NetworkParameters {
		magic: 0xdbb6c0fb,
		supported_bips: vec![84, 49],
		key_prefix: xkey_prefix(0xb0, 2),
		address_prefix: AddressPrefix {
			pubkeyhash: 0x30,
			scripthash: 0x32,
			witnesspubkeyhash: Some(0x06),
			witnessscripthash: Some(0x0a),
			bech32: Some("ltc".to_string()),
		},
		legacy_address_prefix: LegacyAddressPrefix {
			pubkeyhash: None,
			scripthash: Some(0x05),
		},
		forks: Vec::new(),
	}
}

pub fn dogecoin() -> NetworkParameters {
	NetworkParameters {
		magic: 0xc0c0c0c0,
		supported_bips: vec![44, 32],
		key_prefix: KeyPrefix {
			privkey: 0x9e,
			xpubkey: 0x02facafd,
			xprivkey: 0x02fac398,
			xpubkey58: "dgub".to_string(),
			xprivkey58: "dgpv".to_string(),
			coin_type: 3,
		},
		address_prefix: AddressPrefix {
			pubkeyhash: 0x1e,
			scripthash: 0x16,
			witnesspubkeyhash: None,
			witnessscripthash: None,
			bech32: None,
		},
		legacy_address_prefix: LegacyAddressPrefix::default(),
		forks: Vec::new(),
	}
}

pub(crate) fn builtin_networks() -> Vec<(&'static str, NetworkParameters)> {
	vec![
		("bitcoin", bitcoin()),
		("bitcointestnet", bitcoin_testnet()),
		("bitcoincash", bitcoincash()),
		("bitcoingold", bitcoingold()),
		("litecoin", litecoin()),
		("dogecoin", dogecoin()),
	]
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_litecoin_uses_its_own_network_values() {
		let litecoin = litecoin();
		assert_eq!(litecoin.magic, 0xdbb6c0fb);
		assert_ne!(litecoin.magic, bitcoin().magic);
		assert_eq!(litecoin.address_prefix.bech32.as_deref(), Some("ltc"));
		assert_eq!(litecoin.address_prefix.pubkeyhash, 0x30);
		assert_eq!(litecoin.address_prefix.scripthash, 0x32);
		assert_eq!(litecoin.legacy_address_prefix.scripthash, Some(0x05));
		assert_eq!(litecoin.key_prefix.coin_type, 2);
	}

	#[test]
	fn test_bitcoin_magic() {
		assert_eq!(bitcoin().magic, 0xd9b4bef9);
		assert_eq!(bitcoin().address_prefix.bech32.as_deref(), Some("bc"));
	}
}
