use fork_wallet_core::info::all_info;
use fork_wallet_core::keys::{CreatePrivateKeyOptions, WalletInfo};
use fork_wallet_core::plugin::{CacheEngineBuilder, EngineOptions};
use fork_wallet_core::uri::PaymentRequest;
use fork_wallet_core::{NetworkRegistry, PluginError, PluginIo, make_core_plugins};

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

const PLUGIN: &str = "litecoin";

async fn run(data_dir: PathBuf) -> Result<(), PluginError> {
	let registry = NetworkRegistry::builtin()?;
	let plugins = make_core_plugins(all_info(), registry, Arc::new(CacheEngineBuilder));
	let factory = plugins
		.get(PLUGIN)
		.ok_or_else(|| PluginError::Engine(format!("No plugin named {}", PLUGIN)))?;

	let plugin = factory.make_plugin(PluginIo::native(&data_dir, PLUGIN))?;
	info!(
		"Loaded plugin {} ({})",
		plugin.currency_info().display_name,
		plugin.currency_info().currency_code
	);

	let tools = plugin.make_currency_tools().await?;
	let wallet_type = WalletInfo::wallet_type_for(tools.network());
	let keys = tools
		.create_private_key(&wallet_type, &CreatePrivateKeyOptions::default())
		.await?;
	let wallet = WalletInfo {
		id: "demo".to_string(),
		wallet_type,
		keys,
	};

	let public = tools.internal_derive_public_key(&wallet).await?;
	if let Some(xpub) = public.xpub(tools.network()) {
		info!("Extended public key: {}", xpub);
	}
	info!("Splittable into: {:?}", tools.splittable_types(&wallet)?);

	let engine = plugin
		.make_currency_engine(wallet, EngineOptions::default())
		.await?;
	if let Some(address) = engine.receive_address() {
		let uri = tools.encode_uri(&PaymentRequest {
			native_amount: Some(100_000),
			..PaymentRequest::new(address)
		})?;
		info!("Receive address: {}", address);
		info!("Payment URI: {}", uri);
	}
	info!("Cache height: {}", engine.block_height().await);

	plugin.close().await
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::from_default_env()
				.add_directive(tracing::Level::INFO.into()),
		)
		.with_target(false)
		.with_thread_ids(false)
		.with_thread_names(false)
		.with_file(false)
		.with_line_number(false)
		.with_timer(tracing_subscriber::fmt::time::time())
		.init();

	let data_dir = std::env::var("FORK_WALLET_DATA_DIR").unwrap_or_else(|_| "./data".to_string());
	info!("Starting wallet plugin demo, data in {}", data_dir);

	if let Err(e) = run(PathBuf::from(data_dir)).await {
		error!("Demo failed: {}", e);
		std::process::exit(1);
	}
}
