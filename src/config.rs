//! Environment-sourced broker configuration, validated once at startup.
//!
//! | Variable | Meaning |
//! |---|---|
//! | `FYERS_APP_ID` | Broker-assigned client identifier. |
//! | `FYERS_SECRET` | Client secret used to derive the identity hash. |
//! | `FYERS_REDIRECT_URI` (or `REDIRECT_URI`) | Registered redirect URI. |
//! | `FYERS_APP_HASH` | Precomputed identity hash; replaces derivation. |
//! | `FYERS_API_BASE` | API host, default `https://api.fyers.in`. |
//! | `FYERS_DATA_BASE` | Data host, defaults to the API host. |
//! | `FYERS_ACCESS_TOKEN`, `FYERS_REFRESH_TOKEN` | Warm-start tokens. |
//! | `FYERS_DEFAULT_SYMBOLS` | Comma-separated default quote symbols. |
//! | `FYERS_REQUEST_TIMEOUT_SECS` | Per-request timeout, default 10. |

// self
use crate::{
	_prelude::*,
	auth::{ApplicationIdentity, TokenPair},
	error::ConfigError,
	provider::{ApiEnvironment, Endpoints},
};

/// Per-request timeout applied when nothing else is configured.
pub const DEFAULT_REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(10);
/// Symbols quoted when the caller names none.
pub const DEFAULT_SYMBOLS: &[&str] = &["NSE:RELIANCE-EQ", "NSE:TCS-EQ"];

const APP_ID: &str = "FYERS_APP_ID";
const SECRET: &str = "FYERS_SECRET";
const REDIRECT_URI: &str = "FYERS_REDIRECT_URI";
const REDIRECT_URI_FALLBACK: &str = "REDIRECT_URI";
const APP_HASH: &str = "FYERS_APP_HASH";
const API_BASE: &str = "FYERS_API_BASE";
const DATA_BASE: &str = "FYERS_DATA_BASE";
const ACCESS_TOKEN: &str = "FYERS_ACCESS_TOKEN";
const REFRESH_TOKEN: &str = "FYERS_REFRESH_TOKEN";
const DEFAULT_SYMBOLS_VAR: &str = "FYERS_DEFAULT_SYMBOLS";
const REQUEST_TIMEOUT_SECS: &str = "FYERS_REQUEST_TIMEOUT_SECS";

/// Everything the broker needs, collected from one source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrokerConfig {
	/// Fixed application identity (fields may be absent).
	pub identity: ApplicationIdentity,
	/// API host base URL.
	pub api_base: String,
	/// Data host base URL; `None` reuses the API host.
	pub data_base: Option<String>,
	/// Tokens seeded into the store at startup.
	pub initial_tokens: TokenPair,
	/// Symbols quoted by default.
	pub default_symbols: Vec<String>,
	/// Per-request timeout.
	pub request_timeout: StdDuration,
}
impl BrokerConfig {
	/// Reads the configuration from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Reads the configuration through `lookup`, treating blank values as absent.
	///
	/// Fails only on unusable base URLs or timeouts; missing identity fields are left for
	/// [`BrokerConfig::warn_if_incomplete`].
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
		let mut identity = ApplicationIdentity::from_parts(
			get(APP_ID),
			get(SECRET),
			get(REDIRECT_URI).or_else(|| get(REDIRECT_URI_FALLBACK)),
		);

		if let Some(hash) = get(APP_HASH) {
			identity = identity.with_precomputed_hash(hash);
		}

		let default_symbols = match get(DEFAULT_SYMBOLS_VAR) {
			Some(raw) => parse_symbols(&raw),
			None => DEFAULT_SYMBOLS.iter().map(|symbol| (*symbol).to_owned()).collect(),
		};
		let request_timeout = match get(REQUEST_TIMEOUT_SECS) {
			Some(raw) => parse_timeout(&raw)?,
			None => DEFAULT_REQUEST_TIMEOUT,
		};
		let config = Self {
			identity,
			api_base: get(API_BASE).unwrap_or_else(|| Endpoints::DEFAULT_API_BASE.to_owned()),
			data_base: get(DATA_BASE),
			initial_tokens: TokenPair::new(get(ACCESS_TOKEN), get(REFRESH_TOKEN)),
			default_symbols,
			request_timeout,
		};

		config.endpoints()?;

		Ok(config)
	}

	/// Validated endpoints for the configured bases.
	pub fn endpoints(&self) -> Result<Endpoints, ConfigError> {
		Endpoints::new(&self.api_base, self.data_base.as_deref())
	}

	/// Environment implied by the API base.
	pub fn environment(&self) -> ApiEnvironment {
		ApiEnvironment::classify(&self.api_base)
	}

	/// Logs a warning per missing identity field; never fails.
	pub fn warn_if_incomplete(&self) {
		for field in self.identity.missing_fields() {
			tracing::warn!(field, "Fyers identity setting is missing; authentication will fail.");
		}

		if !self.initial_tokens.is_authenticated() {
			tracing::info!("No access token configured; authorization is required.");
		}
	}
}
impl Default for BrokerConfig {
	fn default() -> Self {
		Self {
			identity: ApplicationIdentity::default(),
			api_base: Endpoints::DEFAULT_API_BASE.to_owned(),
			data_base: None,
			initial_tokens: TokenPair::default(),
			default_symbols: DEFAULT_SYMBOLS.iter().map(|symbol| (*symbol).to_owned()).collect(),
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
		}
	}
}

fn parse_symbols(raw: &str) -> Vec<String> {
	raw.split(',').map(str::trim).filter(|symbol| !symbol.is_empty()).map(str::to_owned).collect()
}

fn parse_timeout(raw: &str) -> Result<StdDuration, ConfigError> {
	let secs = u64::from_str(raw.trim()).map_err(|err| ConfigError::InvalidEnv {
		name: REQUEST_TIMEOUT_SECS,
		reason: err.to_string(),
	})?;

	if secs == 0 {
		return Err(ConfigError::InvalidEnv {
			name: REQUEST_TIMEOUT_SECS,
			reason: "timeout must be at least one second".into(),
		});
	}

	Ok(StdDuration::from_secs(secs))
}
