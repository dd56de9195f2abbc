//! The token broker: authorization URL, code exchange, refresh rotation, and quote fetches.

pub mod authorize;

mod common;
mod exchange;
mod quotes;
mod refresh;

pub use authorize::*;

// self
use crate::{
	_prelude::*,
	api::TransportErrorMapper,
	auth::{ApplicationIdentity, Secret},
	http::ApiHttpClient,
	provider::{ApiEnvironment, Endpoints},
	store::TokenStore,
};
#[cfg(feature = "reqwest")]
use crate::{
	api::ReqwestTransportErrorMapper, config::BrokerConfig, http::ReqwestHttpClient,
	store::MemoryStore,
};

#[cfg(feature = "reqwest")]
/// Broker specialized for the crate's default reqwest transport stack.
pub type ReqwestBroker = Broker<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Owns the authentication state machine for a single application identity.
///
/// The broker holds the HTTP client, the token store, the identity, and the resolved endpoints.
/// It is `Unauthenticated` while the store holds no access token and `Authenticated` once an
/// exchange (or a warm start) supplies one; a failed refresh keeps the last known pair. Exchange
/// and refresh run under one async guard so their store writes never interleave, while quote
/// fetches read the pair without taking it.
#[derive(Clone)]
pub struct Broker<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every outbound request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Token store holding the current pair. The broker is its only writer.
	pub store: Arc<dyn TokenStore>,
	/// Fixed application identity.
	pub identity: ApplicationIdentity,
	/// Validated base URLs and the environment they imply.
	pub endpoints: Endpoints,
	/// Symbols used by [`Broker::fetch_default_quotes`].
	pub default_symbols: Vec<String>,
	grant_guard: Arc<AsyncMutex<()>>,
}
impl<C, M> Broker<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a broker that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		store: Arc<dyn TokenStore>,
		identity: ApplicationIdentity,
		endpoints: Endpoints,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			store,
			identity,
			endpoints,
			default_symbols: Vec::new(),
			grant_guard: Default::default(),
		}
	}

	/// Sets the symbols used when a caller asks for the default quote set.
	pub fn with_default_symbols<I, S>(mut self, symbols: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.default_symbols = symbols.into_iter().map(Into::into).collect();

		self
	}

	/// API variant selected by the configured base URL.
	pub fn environment(&self) -> ApiEnvironment {
		self.endpoints.environment()
	}

	/// Current access token, if any (read-only, for health checks and callers).
	pub async fn access_token(&self) -> Result<Option<Secret>> {
		Ok(self.store.load().await?.access_token)
	}

	/// Current refresh token, if any.
	pub async fn refresh_token(&self) -> Result<Option<Secret>> {
		Ok(self.store.load().await?.refresh_token)
	}

	/// Returns true when an access token is held.
	pub async fn is_authenticated(&self) -> Result<bool> {
		Ok(self.store.load().await?.is_authenticated())
	}
}
#[cfg(feature = "reqwest")]
impl Broker<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a reqwest-backed broker with the default request timeout.
	pub fn new(
		store: Arc<dyn TokenStore>,
		identity: ApplicationIdentity,
		endpoints: Endpoints,
	) -> Result<Self> {
		let http_client = ReqwestHttpClient::with_timeout(ReqwestHttpClient::DEFAULT_TIMEOUT)?;

		Ok(Self::with_http_client(
			store,
			identity,
			endpoints,
			http_client,
			ReqwestTransportErrorMapper,
		))
	}

	/// Builds a broker from environment-sourced configuration.
	///
	/// Missing identity fields only produce warnings so the host can keep serving health checks;
	/// the store is seeded with any pre-configured tokens.
	pub fn from_config(config: &BrokerConfig) -> Result<Self> {
		config.warn_if_incomplete();

		let endpoints = config.endpoints()?;
		let http_client = ReqwestHttpClient::with_timeout(config.request_timeout)?;
		let store: Arc<dyn TokenStore> =
			Arc::new(MemoryStore::seeded(config.initial_tokens.clone()));

		tracing::info!(
			environment = endpoints.environment().as_str(),
			warm_start = config.initial_tokens.is_authenticated(),
			"Fyers broker configured."
		);

		Ok(Self::with_http_client(
			store,
			config.identity.clone(),
			endpoints,
			http_client,
			ReqwestTransportErrorMapper,
		)
		.with_default_symbols(config.default_symbols.clone()))
	}
}
impl<C, M> Debug for Broker<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Broker")
			.field("identity", &self.identity)
			.field("endpoints", &self.endpoints)
			.field("default_symbols", &self.default_symbols)
			.finish()
	}
}
