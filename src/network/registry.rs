//! Registry of every fork the plugin family knows about.
//!
//! The registry is filled once at startup and then shared behind an `Arc`.
//! Once shared there is no way to obtain a mutable reference, so the table
//! needs no locking for the rest of the process lifetime.

use crate::network::networks;
use crate::network::types::{NetworkError, NetworkParameters};

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct NetworkRegistry {
	networks: BTreeMap<String, NetworkParameters>,
}

impl NetworkRegistry {
	/// Create an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// The validated table of built-in forks.
	pub fn builtin() -> Result<Arc<Self>, NetworkError> {
		let mut registry = Self::new();
		for (id, params) in networks::builtin_networks() {
			registry.register(id, params)?;
		}
		registry.ready()
	}

	/// Add a network. Registration is append-only.
	pub fn register(
		&mut self,
		network_id: impl Into<String>,
		params: NetworkParameters,
	) -> Result<(), NetworkError> {
		let network_id = network_id.into();
		if self.networks.contains_key(&network_id) {
			return Err(NetworkError::DuplicateNetwork(network_id));
		}
		debug!("Registered network {}", network_id);
		self.networks.insert(network_id, params);
		Ok(())
	}

	/// Check that every fork reference resolves and share the registry.
	pub fn ready(self) -> Result<Arc<Self>, NetworkError> {
		for (network, params) in &self.networks {
			if let Some(fork) = params
				.forks
				.iter()
				.find(|fork| !self.networks.contains_key(fork.as_str()))
			{
				return Err(NetworkError::InvalidForkReference {
					network: network.clone(),
					fork: fork.clone(),
				});
			}
		}
		Ok(Arc::new(self))
	}

	pub fn lookup(&self, network_id: &str) -> Result<&NetworkParameters, NetworkError> {
		self.networks
			.get(network_id)
			.ok_or_else(|| NetworkError::UnknownNetwork(network_id.to_string()))
	}

	pub fn contains(&self, network_id: &str) -> bool {
		self.networks.contains_key(network_id)
	}

	pub fn network_ids(&self) -> impl Iterator<Item = &str> {
		self.networks.keys().map(String::as_str)
	}

	/// Fork family members that accept the given BIP standard.
	///
	/// Order follows the origin's fork list. When `include_origin` is set the
	/// origin itself comes first, provided it supports the standard too.
	pub fn forks_supporting_format(
		&self,
		network_id: &str,
		bip: u32,
		include_origin: bool,
	) -> Result<Vec<String>, NetworkError> {
		let origin = self.lookup(network_id)?;
		let mut out = Vec::new();
		if include_origin && origin.supports_bip(bip) {
			out.push(network_id.to_string());
		}
		for fork in &origin.forks {
			match self.networks.get(fork) {
				Some(params) if params.supports_bip(bip) => out.push(fork.clone()),
				_ => {}
			}
		}
		Ok(out)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn params_with(bips: &[u32], forks: &[&str]) -> NetworkParameters {
		let mut params = networks::bitcoin();
		params.supported_bips = bips.to_vec();
		params.forks = forks.iter().map(|f| f.to_string()).collect();
		params
	}

	#[test]
	fn test_builtin_fork_lists_are_closed() {
		let registry = NetworkRegistry::builtin().expect("builtin registry");
		for id in registry.network_ids() {
			let params = registry.lookup(id).unwrap();
			for fork in &params.forks {
				assert!(registry.contains(fork), "{} references {}", id, fork);
			}
		}
	}

	#[test]
	fn test_lookup_unknown() {
		let registry = NetworkRegistry::builtin().unwrap();
		assert_eq!(
			registry.lookup("nocoin"),
			Err(NetworkError::UnknownNetwork("nocoin".to_string()))
		);
	}

	#[test]
	fn test_register_duplicate() {
		let mut registry = NetworkRegistry::new();
		registry.register("bitcoin", networks::bitcoin()).unwrap();
		let err = registry.register("bitcoin", networks::bitcoin()).unwrap_err();
		assert_eq!(err, NetworkError::DuplicateNetwork("bitcoin".to_string()));
	}

	#[test]
	fn test_ready_rejects_dangling_fork() {
		let mut registry = NetworkRegistry::new();
		registry
			.register("bitcoin", params_with(&[44], &["ghostcoin"]))
			.unwrap();
		assert!(matches!(
			registry.ready(),
			Err(NetworkError::InvalidForkReference { .. })
		));
	}

	#[test]
	fn test_forks_supporting_format_keeps_order() {
		let mut registry = NetworkRegistry::new();
		registry
			.register("origin", params_with(&[44, 84], &["c", "a", "b"]))
			.unwrap();
		registry.register("a", params_with(&[44], &[])).unwrap();
		registry.register("b", params_with(&[84], &[])).unwrap();
		registry.register("c", params_with(&[44, 84], &[])).unwrap();
		let registry = registry.ready().unwrap();

		assert_eq!(
			registry.forks_supporting_format("origin", 44, false).unwrap(),
			vec!["c".to_string(), "a".to_string()]
		);
		assert_eq!(
			registry.forks_supporting_format("origin", 84, true).unwrap(),
			vec!["origin".to_string(), "c".to_string(), "b".to_string()]
		);
		assert!(
			registry
				.forks_supporting_format("origin", 49, true)
				.unwrap()
				.is_empty()
		);
	}

	#[test]
	fn test_litecoin_prefixes() {
		let registry = NetworkRegistry::builtin().unwrap();
		let litecoin = registry.lookup("litecoin").unwrap();
		assert_eq!(litecoin.address_prefix.pubkeyhash, 0x30);
		assert_eq!(litecoin.legacy_address_prefix.scripthash, Some(0x05));
		assert_eq!(litecoin.default_bip(), Some(49));
	}
}
