//! Broker-level error types shared across flows, transports, and stores.

// self
use crate::_prelude::*;

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical broker error exposed by public APIs.
///
/// Every variant renders without secrets, tokens, or the application-identity hash so callers
/// can log the error verbatim.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Token store failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem, detected before any network call.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Upstream rejected the authorization-code exchange.
	#[error("Token exchange was rejected with HTTP {status}.")]
	TokenExchange {
		/// HTTP status returned by the token endpoint.
		status: u16,
		/// Raw response body returned by the token endpoint.
		body: String,
	},
	/// Upstream rejected the refresh-token grant.
	#[error("Token refresh was rejected with HTTP {status}.")]
	Refresh {
		/// HTTP status returned by the refresh endpoint.
		status: u16,
		/// Raw response body returned by the refresh endpoint.
		body: String,
	},
	/// Quotes endpoint answered with a status of 400 or above.
	#[error("Quotes request failed with HTTP {status}.")]
	QuoteFetch {
		/// HTTP status returned by the quotes endpoint.
		status: u16,
		/// Raw response body returned by the quotes endpoint.
		body: String,
	},
	/// Upstream answered 2xx with a body that does not match the expected JSON shape.
	#[error("Upstream returned malformed JSON with HTTP {status}.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status returned alongside the body.
		status: u16,
	},

	/// No refresh token is held; the full authorization flow must run again.
	#[error("No refresh token is available; authorize the application first.")]
	NoRefreshToken,
	/// No access token is held; quotes cannot be requested.
	#[error("Access token is missing; authorize the application first.")]
	Unauthenticated,
	/// The redirect did not carry an authorization code.
	#[error("Authorization code is missing.")]
	MissingAuthorizationCode,
	/// The quote request named no symbols.
	#[error("At least one symbol is required to fetch quotes.")]
	EmptySymbols,
	/// The `state` returned by the redirect does not match the issued one.
	#[error("Authorization state mismatch.")]
	StateMismatch,
}
impl Error {
	/// HTTP status reported by the upstream API, when the failure came from a response.
	pub fn upstream_status(&self) -> Option<u16> {
		match self {
			Self::TokenExchange { status, .. }
			| Self::Refresh { status, .. }
			| Self::QuoteFetch { status, .. }
			| Self::ResponseParse { status, .. } => Some(*status),
			_ => None,
		}
	}

	/// Raw response body reported by the upstream API, when one was received.
	pub fn upstream_body(&self) -> Option<&str> {
		match self {
			Self::TokenExchange { body, .. }
			| Self::Refresh { body, .. }
			| Self::QuoteFetch { body, .. } => Some(body),
			_ => None,
		}
	}

	/// Returns true when the failure was detected locally and no request left the process.
	pub fn is_local_precondition(&self) -> bool {
		matches!(
			self,
			Self::Config(_)
				| Self::NoRefreshToken
				| Self::Unauthenticated
				| Self::MissingAuthorizationCode
				| Self::EmptySymbols
				| Self::StateMismatch
		)
	}
}

/// Configuration and validation failures raised by the broker.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A required identity field is absent or empty.
	#[error("Configuration is missing `{field}`.")]
	MissingField {
		/// Name of the missing field.
		field: &'static str,
	},
	/// A base URL cannot be parsed.
	#[error("The `{field}` base URL is invalid.")]
	InvalidBaseUrl {
		/// Name of the offending setting.
		field: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A base URL parses but cannot serve as a path prefix.
	#[error("The `{field}` base URL must be an http(s) URL without query or fragment.")]
	InvalidBaseUrlShape {
		/// Name of the offending setting.
		field: &'static str,
	},
	/// An environment variable holds an unusable value.
	#[error("Environment variable `{name}` is invalid: {reason}.")]
	InvalidEnv {
		/// Variable name.
		name: &'static str,
		/// Human-readable reason.
		reason: String,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// JSON payload could not be encoded.
	#[error("Request payload could not be encoded.")]
	PayloadEncode(#[source] serde_json::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO, timeouts).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the Fyers API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The request did not complete within the configured timeout.
	#[error("Request to the Fyers API timed out.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the Fyers API.")]
	Io(#[from] std::io::Error),
	/// Any other client failure reported without a typed source.
	#[error("HTTP client error occurred while calling the Fyers API: {message}.")]
	Other {
		/// Client-supplied description.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}
