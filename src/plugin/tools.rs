//! Per-plugin tools object: key creation, public derivation and payment URIs
//! for one network, over the plugin's shared cache.

use crate::cache::PluginStateCache;
use crate::info::{CurrencyInfo, CurrencyPluginSettings};
use crate::keys::{CreatePrivateKeyOptions, KeyDerivation, KeyError, WalletInfo, WalletKeyMaterial};
use crate::network::{NetworkParameters, NetworkRegistry};
use crate::plugin::io::PluginIo;
use crate::plugin::types::PluginError;
use crate::uri::{PaymentRequest, UriCodec};

use std::sync::Arc;
use tracing::{Instrument, debug, info};

pub struct CurrencyTools {
	settings: CurrencyPluginSettings,
	params: NetworkParameters,
	derivation: KeyDerivation,
	uri: UriCodec,
	state: PluginStateCache,
	io: PluginIo,
}

impl CurrencyTools {
	/// Build the tools and load the plugin cache. Fails if a mandatory cache
	/// file cannot be loaded.
	pub(crate) async fn load(
		settings: CurrencyPluginSettings,
		registry: Arc<NetworkRegistry>,
		io: PluginIo,
	) -> Result<Self, PluginError> {
		let params = registry.lookup(&settings.engine_info.network)?.clone();
		let state = PluginStateCache::new(
			settings.currency_info.plugin_name.clone(),
			io.storage.clone(),
			io.cache_config.clone(),
			settings.currency_info.default_settings.clone(),
			io.settings_overrides.clone(),
			io.log.clone(),
		);
		state.load().await?;

		info!(
			parent: &io.log,
			"Currency tools ready for {}", settings.engine_info.network
		);
		Ok(Self {
			derivation: KeyDerivation::new(registry.clone(), io.crypto.clone()),
			uri: UriCodec::new(registry),
			settings,
			params,
			state,
			io,
		})
	}

	pub fn currency_info(&self) -> &CurrencyInfo {
		&self.settings.currency_info
	}

	pub fn network(&self) -> &str {
		&self.settings.engine_info.network
	}

	pub fn params(&self) -> &NetworkParameters {
		&self.params
	}

	pub fn plugin_state(&self) -> &PluginStateCache {
		&self.state
	}

	pub(crate) fn io(&self) -> &PluginIo {
		&self.io
	}

	fn check_wallet_type(&self, wallet_type: &str) -> Result<(), KeyError> {
		if wallet_type != WalletInfo::wallet_type_for(self.network()) {
			return Err(KeyError::InvalidKeyName(format!(
				"{} is not handled by the {} plugin",
				wallet_type,
				self.currency_info().plugin_name
			)));
		}
		Ok(())
	}

	pub(crate) fn check_wallet(&self, wallet_info: &WalletInfo) -> Result<(), PluginError> {
		Ok(self.check_wallet_type(&wallet_info.wallet_type)?)
	}

	/// New private key bundle for `wallet_type`, which must be this plugin's
	/// `wallet:<network>`.
	pub async fn create_private_key(
		&self,
		wallet_type: &str,
		options: &CreatePrivateKeyOptions,
	) -> Result<WalletKeyMaterial, PluginError> {
		self.check_wallet_type(wallet_type)?;
		let keys = self
			.derivation
			.create_private_key(self.io.random.as_ref(), self.network(), options)
			.instrument(self.io.log.clone())
			.await?;
		Ok(keys)
	}

	/// Public half of the host contract. Returns an empty bundle; callers
	/// that need the extended public key use `internal_derive_public_key`.
	pub async fn derive_public_key(
		&self,
		wallet_info: &WalletInfo,
	) -> Result<WalletKeyMaterial, PluginError> {
		self.check_wallet(wallet_info)?;
		debug!(parent: &self.io.log, "derive_public_key called for {}", wallet_info.id);
		Ok(WalletKeyMaterial::new())
	}

	/// The wallet's keys with `<network>Xpub` added.
	pub async fn internal_derive_public_key(
		&self,
		wallet_info: &WalletInfo,
	) -> Result<WalletKeyMaterial, PluginError> {
		self.check_wallet(wallet_info)?;
		let keys = self
			.derivation
			.derive_xpub(&wallet_info.keys, self.network())
			.instrument(self.io.log.clone())
			.await?;
		Ok(keys)
	}

	/// Other networks this wallet's seed can be split into.
	pub fn splittable_types(&self, wallet_info: &WalletInfo) -> Result<Vec<String>, PluginError> {
		self.check_wallet(wallet_info)?;
		Ok(self
			.derivation
			.splittable_wallet_types(&wallet_info.keys, self.network())?)
	}

	pub async fn derive_address(
		&self,
		wallet_info: &WalletInfo,
		change: u32,
		index: u32,
	) -> Result<String, PluginError> {
		self.check_wallet(wallet_info)?;
		Ok(self
			.derivation
			.derive_address(&wallet_info.keys, self.network(), change, index)
			.await?)
	}

	pub fn parse_uri(&self, uri: &str) -> Result<PaymentRequest, PluginError> {
		Ok(self.uri.parse(uri, self.network(), self.currency_info())?)
	}

	pub fn encode_uri(&self, request: &PaymentRequest) -> Result<String, PluginError> {
		Ok(self.uri.encode(request, self.network(), self.currency_info())?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::cache::MemoryPluginStorage;
	use crate::crypto::{NativeCrypto, OsRandom};
	use crate::info::all_info;
	use tracing::Span;

	async fn tools(plugin_name: &str) -> CurrencyTools {
		let settings = all_info()
			.into_iter()
			.find(|s| s.currency_info.plugin_name == plugin_name)
			.unwrap();
		let io = PluginIo::new(
			Arc::new(OsRandom),
			Arc::new(NativeCrypto::new()),
			Arc::new(MemoryPluginStorage::new()),
			Span::none(),
		);
		CurrencyTools::load(settings, NetworkRegistry::builtin().unwrap(), io)
			.await
			.unwrap()
	}

	async fn wallet(tools: &CurrencyTools, format: &str) -> WalletInfo {
		let keys = tools
			.create_private_key(
				&WalletInfo::wallet_type_for(tools.network()),
				&CreatePrivateKeyOptions {
					format: Some(format.to_string()),
					coin_type: None,
				},
			)
			.await
			.unwrap();
		WalletInfo {
			id: "wallet-1".to_string(),
			wallet_type: WalletInfo::wallet_type_for(tools.network()),
			keys,
		}
	}

	#[tokio::test]
	async fn test_create_private_key_rejects_foreign_wallet_type() {
		let tools = tools("litecoin").await;
		let err = tools
			.create_private_key("wallet:bitcoin", &CreatePrivateKeyOptions::default())
			.await
			.unwrap_err();
		assert!(matches!(err, PluginError::Key(KeyError::InvalidKeyName(_))));
	}

	#[tokio::test]
	async fn test_public_key_entry_points() {
		let tools = tools("litecoin").await;
		let wallet = wallet(&tools, "bip49").await;

		assert!(tools.derive_public_key(&wallet).await.unwrap().is_empty());

		let keys = tools.internal_derive_public_key(&wallet).await.unwrap();
		let xpub = keys.xpub("litecoin").unwrap();
		assert!(xpub.starts_with(&tools.params().key_prefix.xpubkey58));
		assert_eq!(keys.seed("litecoin"), wallet.keys.seed("litecoin"));
	}

	#[tokio::test]
	async fn test_derived_address_round_trips_through_uri() {
		let tools = tools("litecoin").await;
		let wallet = wallet(&tools, "bip84").await;
		let address = tools.derive_address(&wallet, 0, 0).await.unwrap();
		assert!(address.starts_with("ltc1"));

		let mut request = PaymentRequest::new(address);
		request.native_amount = Some(150_000_000);
		request.label = Some("Coffee shop".to_string());
		let uri = tools.encode_uri(&request).unwrap();
		assert!(uri.starts_with("litecoin:"));
		assert_eq!(tools.parse_uri(&uri).unwrap(), request);
	}

	#[tokio::test]
	async fn test_splittable_types_for_bitcoin() {
		let tools = tools("bitcoin").await;
		let wallet = wallet(&tools, "bip44").await;
		assert_eq!(
			tools.splittable_types(&wallet).unwrap(),
			vec!["wallet:bitcoincash".to_string(), "wallet:bitcoingold".to_string()]
		);
	}
}
