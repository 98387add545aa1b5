//! Static currency metadata for each plugin in the family.

mod all;

pub use all::all_info;

use serde::{Deserialize, Serialize};

/// A display unit and its size in base units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Denomination {
	pub name: String,
	/// Base units per display unit, a power of ten
	pub multiplier: u64,
	pub symbol: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyInfo {
	/// Plugin name, also the payment URI scheme
	pub plugin_name: String,
	pub currency_code: String,
	pub display_name: String,
	pub denominations: Vec<Denomination>,
	/// Compiled-in settings that host overrides are laid over
	pub default_settings: serde_json::Value,
}

impl CurrencyInfo {
	/// The denomination named after the currency code.
	pub fn base_denomination(&self) -> Option<&Denomination> {
		self.denominations
			.iter()
			.find(|d| d.name == self.currency_code)
	}
}

/// Engine-side configuration of a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineInfo {
	/// Registry id of the network this plugin serves
	pub network: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyPluginSettings {
	pub currency_info: CurrencyInfo,
	pub engine_info: EngineInfo,
}
