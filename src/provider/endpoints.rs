//! Endpoint resolution for every operation the broker performs.
//!
//! Resolution is a pure function of the two base URLs and the [`ApiEnvironment`]; bases are
//! validated once by [`Endpoints::new`] so later lookups only concatenate fixed paths.

// crates.io
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
// self
use crate::{_prelude::*, error::ConfigError, provider::ApiEnvironment};

/// URI-component escape set: unreserved characters and `!*()` stay literal. `'` is escaped
/// because `Url` escapes it in special-scheme queries anyway.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
	.remove(b'-')
	.remove(b'_')
	.remove(b'.')
	.remove(b'!')
	.remove(b'~')
	.remove(b'*')
	.remove(b'(')
	.remove(b')');

/// Operations that need a concrete upstream URL.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
	/// Browser-facing login page that issues the authorization code.
	Authorize,
	/// Authorization-code exchange.
	ExchangeToken,
	/// Refresh-token grant.
	RefreshToken,
	/// Market quotes lookup.
	Quotes,
}
impl Operation {
	/// Path appended to the relevant base URL in the given environment.
	pub const fn path(self, environment: ApiEnvironment) -> &'static str {
		match (self, environment.uses_validate_flow()) {
			(Self::Authorize, _) => "/api/v3/generate-authcode",
			(Self::ExchangeToken, true) => "/api/v3/validate-authcode",
			(Self::ExchangeToken, false) => "/api/v3/token",
			(Self::RefreshToken, true) => "/api/v3/validate-refresh-token",
			(Self::RefreshToken, false) => "/api/v3/refresh-token",
			(Self::Quotes, true) => "/data/quotes",
			(Self::Quotes, false) => "/data-rest/v3/quotes/",
		}
	}

	/// Returns true when the operation targets the data host rather than the API host.
	pub const fn uses_data_base(self) -> bool {
		matches!(self, Self::Quotes)
	}
}

/// Resolves the URL for `operation` from raw base URLs.
pub fn resolve(
	api_base: &str,
	data_base: &str,
	environment: ApiEnvironment,
	operation: Operation,
) -> Result<Url, ConfigError> {
	let (field, base) =
		if operation.uses_data_base() { ("data_base", data_base) } else { ("api_base", api_base) };
	let raw = format!("{}{}", base.trim().trim_end_matches('/'), operation.path(environment));

	Url::parse(&raw).map_err(|source| ConfigError::InvalidBaseUrl { field, source })
}

/// Validated base URLs plus the environment they imply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
	api_base: String,
	data_base: String,
	environment: ApiEnvironment,
}
impl Endpoints {
	/// Live API host used when nothing else is configured.
	pub const DEFAULT_API_BASE: &'static str = "https://api.fyers.in";

	/// Validates both bases and classifies the environment from `api_base`.
	///
	/// `data_base` defaults to `api_base` when absent.
	pub fn new(api_base: &str, data_base: Option<&str>) -> Result<Self, ConfigError> {
		let api_base = validate_base("api_base", api_base)?;
		let data_base = match data_base {
			Some(value) => validate_base("data_base", value)?,
			None => api_base.clone(),
		};
		let environment = ApiEnvironment::classify(&api_base);

		Ok(Self { api_base, data_base, environment })
	}

	/// Normalized API base (no trailing slash).
	pub fn api_base(&self) -> &str {
		&self.api_base
	}

	/// Normalized data base (no trailing slash).
	pub fn data_base(&self) -> &str {
		&self.data_base
	}

	/// Environment classified from the API base.
	pub fn environment(&self) -> ApiEnvironment {
		self.environment
	}

	/// Resolves the bare URL for `operation`.
	pub fn resolve(&self, operation: Operation) -> Result<Url, ConfigError> {
		resolve(&self.api_base, &self.data_base, self.environment, operation)
	}

	/// Login URL the user is sent to; parameters are form-encoded in a fixed order.
	pub fn authorize_url(
		&self,
		client_id: &str,
		redirect_uri: &str,
		state: &str,
	) -> Result<Url, ConfigError> {
		let mut url = self.resolve(Operation::Authorize)?;

		url.query_pairs_mut()
			.append_pair("client_id", client_id)
			.append_pair("redirect_uri", redirect_uri)
			.append_pair("response_type", "code")
			.append_pair("state", state);

		Ok(url)
	}

	/// Quotes URL carrying the comma-joined `symbols` parameter.
	///
	/// The value is percent-encoded as a URI component (spaces become `%20`, not `+`).
	pub fn quotes_url<S>(&self, symbols: &[S]) -> Result<Url, ConfigError>
	where
		S: AsRef<str>,
	{
		let joined = symbols.iter().map(|symbol| symbol.as_ref()).collect::<Vec<&str>>().join(",");
		let mut url = self.resolve(Operation::Quotes)?;

		url.set_query(Some(&format!("symbols={}", utf8_percent_encode(&joined, URI_COMPONENT))));

		Ok(url)
	}
}
impl Default for Endpoints {
	fn default() -> Self {
		Self {
			api_base: Self::DEFAULT_API_BASE.into(),
			data_base: Self::DEFAULT_API_BASE.into(),
			environment: ApiEnvironment::Production,
		}
	}
}

fn validate_base(field: &'static str, raw: &str) -> Result<String, ConfigError> {
	let trimmed = raw.trim().trim_end_matches('/');
	let parsed =
		Url::parse(trimmed).map_err(|source| ConfigError::InvalidBaseUrl { field, source })?;

	if !matches!(parsed.scheme(), "http" | "https")
		|| parsed.query().is_some()
		|| parsed.fragment().is_some()
	{
		return Err(ConfigError::InvalidBaseUrlShape { field });
	}

	Ok(trimmed.to_owned())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn resolved(endpoints: &Endpoints, operation: Operation) -> String {
		endpoints.resolve(operation).expect("Endpoint should resolve.").to_string()
	}

	#[test]
	fn production_resolution_table() {
		let endpoints = Endpoints::new("https://api.fyers.in", Some("https://data.fyers.in"))
			.expect("Production bases should validate.");

		assert_eq!(endpoints.environment(), ApiEnvironment::Production);
		assert_eq!(
			resolved(&endpoints, Operation::Authorize),
			"https://api.fyers.in/api/v3/generate-authcode"
		);
		assert_eq!(
			resolved(&endpoints, Operation::ExchangeToken),
			"https://api.fyers.in/api/v3/token"
		);
		assert_eq!(
			resolved(&endpoints, Operation::RefreshToken),
			"https://api.fyers.in/api/v3/refresh-token"
		);
		assert_eq!(
			resolved(&endpoints, Operation::Quotes),
			"https://data.fyers.in/data-rest/v3/quotes/"
		);
	}

	#[test]
	fn test_resolution_table() {
		let endpoints =
			Endpoints::new("https://api-t1.fyers.in/", None).expect("Test base should validate.");

		assert_eq!(endpoints.environment(), ApiEnvironment::Test);
		assert_eq!(endpoints.data_base(), "https://api-t1.fyers.in");
		assert_eq!(
			resolved(&endpoints, Operation::Authorize),
			"https://api-t1.fyers.in/api/v3/generate-authcode"
		);
		assert_eq!(
			resolved(&endpoints, Operation::ExchangeToken),
			"https://api-t1.fyers.in/api/v3/validate-authcode"
		);
		assert_eq!(
			resolved(&endpoints, Operation::RefreshToken),
			"https://api-t1.fyers.in/api/v3/validate-refresh-token"
		);
		assert_eq!(resolved(&endpoints, Operation::Quotes), "https://api-t1.fyers.in/data/quotes");
	}

	#[test]
	fn free_resolver_matches_struct() {
		let url = resolve(
			"https://api.fyers.in",
			"https://api.fyers.in",
			ApiEnvironment::Test,
			Operation::Quotes,
		)
		.expect("Free resolver should succeed.");

		assert_eq!(url.as_str(), "https://api.fyers.in/data/quotes");
	}

	#[test]
	fn authorize_url_is_encoded_and_idempotent() {
		let endpoints = Endpoints::default();
		let first = endpoints
			.authorize_url("APP1", "http://x/callback", "s1")
			.expect("Authorize URL should build.");
		let second = endpoints
			.authorize_url("APP1", "http://x/callback", "s1")
			.expect("Authorize URL should build twice.");

		assert_eq!(
			first.as_str(),
			"https://api.fyers.in/api/v3/generate-authcode?client_id=APP1&redirect_uri=http%3A%2F%2Fx%2Fcallback&response_type=code&state=s1"
		);
		assert_eq!(first.as_str(), second.as_str());
	}

	#[test]
	fn quotes_url_joins_and_encodes_symbols() {
		let endpoints = Endpoints::default();
		let url = endpoints
			.quotes_url(&["NSE:SBIN-EQ", "NSE:TCS-EQ"])
			.expect("Quotes URL should build.");

		assert_eq!(
			url.as_str(),
			"https://api.fyers.in/data-rest/v3/quotes/?symbols=NSE%3ASBIN-EQ%2CNSE%3ATCS-EQ"
		);
	}

	#[test]
	fn quotes_url_encodes_like_a_uri_component() {
		let url = Endpoints::default()
			.quotes_url(&["NSE:M M~X", "BSE:A'B(1)*"])
			.expect("Quotes URL should build.");

		assert_eq!(url.query(), Some("symbols=NSE%3AM%20M~X%2CBSE%3AA%27B(1)*"));
	}

	#[test]
	fn bases_are_validated_once() {
		assert!(matches!(
			Endpoints::new("not a url", None),
			Err(ConfigError::InvalidBaseUrl { field: "api_base", .. })
		));
		assert!(matches!(
			Endpoints::new("https://api.fyers.in", Some("https://data.fyers.in?x=1")),
			Err(ConfigError::InvalidBaseUrlShape { field: "data_base" })
		));
		assert!(matches!(
			Endpoints::new("ftp://api.fyers.in", None),
			Err(ConfigError::InvalidBaseUrlShape { field: "api_base" })
		));
	}
}
