//! Payment URI encoding and parsing.
//!
//! Grammar: `<pluginName>:<address>[?amount=<decimal>&label=<text>&message=<text>]`.
//! A bare address with no scheme is also accepted when parsing, and a request
//! without amount, label or message encodes to the bare address.

use crate::address::Address;
use crate::info::CurrencyInfo;
use crate::network::{NetworkError, NetworkParameters, NetworkRegistry};
use crate::uri::types::{PaymentRequest, UriError};

use std::sync::Arc;
use url::form_urlencoded;

#[derive(Clone)]
pub struct UriCodec {
	registry: Arc<NetworkRegistry>,
}

impl UriCodec {
	pub fn new(registry: Arc<NetworkRegistry>) -> Self {
		Self { registry }
	}

	fn params(&self, network: &str) -> Result<&NetworkParameters, UriError> {
		self.registry
			.lookup(network)
			.map_err(|e: NetworkError| UriError::MalformedUri(e.to_string()))
	}

	pub fn encode(
		&self,
		request: &PaymentRequest,
		network: &str,
		info: &CurrencyInfo,
	) -> Result<String, UriError> {
		encode_uri(request, self.params(network)?, info)
	}

	pub fn parse(
		&self,
		uri: &str,
		network: &str,
		info: &CurrencyInfo,
	) -> Result<PaymentRequest, UriError> {
		parse_uri(uri, self.params(network)?, info)
	}
}

fn validate_address(address: &str, params: &NetworkParameters) -> Result<(), UriError> {
	Address::decode(address, params)
		.map(|_| ())
		.map_err(|e| UriError::InvalidAddress {
			address: address.to_string(),
			reason: e.to_string(),
		})
}

/// Number of decimal places in the currency's main denomination.
fn decimals(info: &CurrencyInfo) -> Result<u32, UriError> {
	let multiplier = info
		.base_denomination()
		.map(|d| d.multiplier)
		.ok_or_else(|| {
			UriError::MalformedUri(format!("no {} denomination", info.currency_code))
		})?;
	let mut places = 0;
	let mut rest = multiplier;
	while rest > 1 && rest % 10 == 0 {
		rest /= 10;
		places += 1;
	}
	if rest != 1 {
		return Err(UriError::MalformedUri(format!(
			"multiplier {} is not a power of ten",
			multiplier
		)));
	}
	Ok(places)
}

fn format_amount(native: u64, places: u32) -> String {
	if places == 0 {
		return native.to_string();
	}
	let scale = 10u64.pow(places);
	let fraction = format!("{:0width$}", native % scale, width = places as usize);
	let fraction = fraction.trim_end_matches('0');
	if fraction.is_empty() {
		(native / scale).to_string()
	} else {
		format!("{}.{}", native / scale, fraction)
	}
}

fn parse_amount(text: &str, places: u32) -> Result<u64, UriError> {
	let malformed = || UriError::MalformedUri(format!("unparsable amount '{}'", text));
	let (whole, fraction) = text.split_once('.').unwrap_or((text, ""));
	if (whole.is_empty() && fraction.is_empty())
		|| fraction.len() > places as usize
		|| !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit())
	{
		return Err(malformed());
	}

	let scale = 10u64.pow(places);
	let whole = if whole.is_empty() {
		0
	} else {
		whole.parse::<u64>().map_err(|_| malformed())?
	};
	let fraction = if fraction.is_empty() {
		0
	} else {
		fraction.parse::<u64>().map_err(|_| malformed())?
			* 10u64.pow(places - fraction.len() as u32)
	};
	whole
		.checked_mul(scale)
		.and_then(|w| w.checked_add(fraction))
		.ok_or_else(malformed)
}

pub fn encode_uri(
	request: &PaymentRequest,
	params: &NetworkParameters,
	info: &CurrencyInfo,
) -> Result<String, UriError> {
	validate_address(&request.public_address, params)?;

	let mut query = form_urlencoded::Serializer::new(String::new());
	let mut has_query = false;
	if let Some(amount) = request.native_amount {
		query.append_pair("amount", &format_amount(amount, decimals(info)?));
		has_query = true;
	}
	if let Some(label) = &request.label {
		query.append_pair("label", label);
		has_query = true;
	}
	if let Some(message) = &request.message {
		query.append_pair("message", message);
		has_query = true;
	}

	if !has_query {
		return Ok(request.public_address.clone());
	}
	Ok(format!(
		"{}:{}?{}",
		info.plugin_name,
		request.public_address,
		query.finish()
	))
}

pub fn parse_uri(
	uri: &str,
	params: &NetworkParameters,
	info: &CurrencyInfo,
) -> Result<PaymentRequest, UriError> {
	let uri = uri.trim();
	let rest = match uri.split_once(':') {
		Some((scheme, rest)) => {
			if !scheme.eq_ignore_ascii_case(&info.plugin_name) {
				return Err(UriError::MalformedUri(format!(
					"expected scheme '{}', got '{}'",
					info.plugin_name, scheme
				)));
			}
			rest.strip_prefix("//").unwrap_or(rest)
		}
		None => uri,
	};
	let (address, query) = rest.split_once('?').unwrap_or((rest, ""));
	if address.is_empty() {
		return Err(UriError::MalformedUri("missing address".to_string()));
	}

	let mut request = PaymentRequest::new(address);
	for (key, value) in form_urlencoded::parse(query.as_bytes()) {
		match key.as_ref() {
			"amount" => request.native_amount = Some(parse_amount(&value, decimals(info)?)?),
			"label" => request.label = Some(value.into_owned()),
			"message" => request.message = Some(value.into_owned()),
			_ => {}
		}
	}

	validate_address(&request.public_address, params)?;
	Ok(request)
}
