use super::{CurrencyInfo, CurrencyPluginSettings, Denomination, EngineInfo};

use serde_json::json;

fn denominations(code: &str, milli: &str) -> Vec<Denomination> {
	vec![
		Denomination {
			name: code.to_string(),
			multiplier: 100_000_000,
			symbol: None,
		},
		Denomination {
			name: milli.to_string(),
			multiplier: 100_000,
			symbol: None,
		},
	]
}

fn plugin(
	plugin_name: &str,
	network: &str,
	currency_code: &str,
	display_name: &str,
	electrum_servers: &[&str],
) -> CurrencyPluginSettings {
	CurrencyPluginSettings {
		currency_info: CurrencyInfo {
			plugin_name: plugin_name.to_string(),
			currency_code: currency_code.to_string(),
			display_name: display_name.to_string(),
			denominations: denominations(currency_code, &format!("m{}", currency_code)),
			default_settings: json!({
				"electrumServers": electrum_servers,
				"infoServer": "https://info1.edge.app/v1",
				"feeInfoServer": "",
				"disableFetchingServers": false,
			}),
		},
		engine_info: EngineInfo {
			network: network.to_string(),
		},
	}
}

/// Settings for every plugin shipped with the core.
pub fn all_info() -> Vec<CurrencyPluginSettings> {
	vec![
		plugin(
			"bitcoin",
			"bitcoin",
			"BTC",
			"Bitcoin",
			&[
				"electrum://electrum.hsmiths.com:50001",
				"electrum://node.arihanc.com:50001",
			],
		),
		plugin(
			"bitcointestnet",
			"bitcointestnet",
			"TESTBTC",
			"Bitcoin Testnet",
			&["electrum://testnet.hsmiths.com:53011"],
		),
		plugin(
			"bitcoincash",
			"bitcoincash",
			"BCH",
			"Bitcoin Cash",
			&["electrum://bch.imaginary.cash:50001"],
		),
		plugin(
			"bitcoingold",
			"bitcoingold",
			"BTG",
			"Bitcoin Gold",
			&["electrum://electrumx-eu.bitcoingold.org:50001"],
		),
		plugin(
			"litecoin",
			"litecoin",
			"LTC",
			"Litecoin",
			&[
				"electrum://electrum-ltc.bysh.me:50001",
				"electrum://electrum.ltc.xurious.com:50001",
			],
		),
		plugin(
			"dogecoin",
			"dogecoin",
			"DOGE",
			"Dogecoin",
			&["electrum://electrum1.cipig.net:10060"],
		),
	]
}
