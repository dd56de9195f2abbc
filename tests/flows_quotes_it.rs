#![cfg(feature = "reqwest")]

// std
use std::{sync::Arc, time::Duration};
// crates.io
use httpmock::prelude::*;
// self
use fyers_broker::{
	api::ReqwestTransportErrorMapper,
	auth::{ApplicationIdentity, TokenPair},
	config::BrokerConfig,
	error::{Error, TransportError},
	flows::{Broker, ReqwestBroker},
	http::ReqwestHttpClient,
	provider::Endpoints,
	store::{MemoryStore, TokenStore},
};

fn identity() -> ApplicationIdentity {
	ApplicationIdentity::new("APP1", "SECRET1", "http://x/callback")
}

fn build_broker(endpoints: Endpoints, pair: TokenPair) -> ReqwestBroker {
	let store: Arc<dyn TokenStore> = Arc::new(MemoryStore::seeded(pair));

	ReqwestBroker::new(store, identity(), endpoints).expect("Reqwest broker should build.")
}

fn authenticated() -> TokenPair {
	TokenPair::new(Some("tok".into()), Some("refresh".into()))
}

#[tokio::test]
async fn quotes_forward_symbols_and_authorization() {
	let server = MockServer::start_async().await;
	let endpoints = Endpoints::new(&server.base_url(), None).expect("Base URL should validate.");
	let broker = build_broker(endpoints, authenticated());
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/data-rest/v3/quotes/")
				.query_param("symbols", "NSE:SBIN-EQ,NSE:TCS-EQ")
				.header("authorization", "APP1:tok");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"s\":\"ok\",\"d\":[{\"n\":\"NSE:SBIN-EQ\",\"v\":{\"lp\":812.5}}]}");
		})
		.await;
	let quotes = broker
		.fetch_quotes(&["NSE:SBIN-EQ", " NSE:TCS-EQ "])
		.await
		.expect("Quotes should be returned.");

	mock.assert_async().await;

	assert_eq!(quotes["s"], "ok");
	assert_eq!(quotes["d"][0]["n"], "NSE:SBIN-EQ");
}

#[tokio::test]
async fn quotes_use_the_data_host_when_configured() {
	let api = MockServer::start_async().await;
	let data = MockServer::start_async().await;
	let endpoints = Endpoints::new(&api.base_url(), Some(&data.base_url()))
		.expect("Both bases should validate.");
	let broker = build_broker(endpoints, authenticated());
	let api_mock = api
		.mock_async(|when, then| {
			when.path("/data-rest/v3/quotes/");
			then.status(200).body("{}");
		})
		.await;
	let data_mock = data
		.mock_async(|when, then| {
			when.method(GET).path("/data-rest/v3/quotes/");
			then.status(200).header("content-type", "application/json").body("{\"s\":\"ok\"}");
		})
		.await;

	broker.fetch_quotes(&["NSE:SBIN-EQ"]).await.expect("Quotes should be returned.");

	data_mock.assert_async().await;
	api_mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn quote_errors_surface_status_and_body() {
	let server = MockServer::start_async().await;
	let endpoints = Endpoints::new(&server.base_url(), None).expect("Base URL should validate.");
	let broker = build_broker(endpoints, authenticated());
	let _mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/data-rest/v3/quotes/");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"s\":\"error\",\"code\":-15,\"message\":\"token expired\"}");
		})
		.await;
	let err = broker.fetch_quotes(&["NSE:SBIN-EQ"]).await.expect_err("401 should fail.");

	match err {
		Error::QuoteFetch { status, body } => {
			assert_eq!(status, 401);
			assert!(body.contains("token expired"));
		},
		other => panic!("Unexpected error: {other:?}."),
	}
}

#[tokio::test]
async fn quotes_require_an_access_token() {
	let server = MockServer::start_async().await;
	let endpoints = Endpoints::new(&server.base_url(), None).expect("Base URL should validate.");
	let broker = build_broker(endpoints, TokenPair::new(None, Some("refresh".into())));
	let mock = server
		.mock_async(|when, then| {
			when.path("/data-rest/v3/quotes/");
			then.status(200).body("{}");
		})
		.await;
	let err = broker.fetch_quotes(&["NSE:SBIN-EQ"]).await.expect_err("Quotes need a token.");

	assert!(matches!(err, Error::Unauthenticated));

	let err = broker.fetch_quotes(&["", "  "]).await.expect_err("Blank symbols are rejected.");

	assert!(matches!(err, Error::EmptySymbols));

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn slow_upstream_maps_to_timeout() {
	let server = MockServer::start_async().await;
	let endpoints = Endpoints::new(&server.base_url(), None).expect("Base URL should validate.");
	let store: Arc<dyn TokenStore> = Arc::new(MemoryStore::seeded(authenticated()));
	let http_client = ReqwestHttpClient::with_timeout(Duration::from_millis(200))
		.expect("Client with a short timeout should build.");
	let broker = Broker::<ReqwestHttpClient, ReqwestTransportErrorMapper>::with_http_client(
		store,
		identity(),
		endpoints,
		http_client,
		ReqwestTransportErrorMapper,
	);
	let _mock = server
		.mock_async(|when, then| {
			when.path("/data-rest/v3/quotes/");
			then.status(200).delay(Duration::from_secs(3)).body("{}");
		})
		.await;
	let err =
		broker.fetch_quotes(&["NSE:SBIN-EQ"]).await.expect_err("Slow upstream should time out.");

	assert!(matches!(err, Error::Transport(TransportError::Timeout { .. })));
}

#[tokio::test]
async fn configured_broker_warm_starts_and_quotes_defaults() {
	let server = MockServer::start_async().await;
	let base_url = server.base_url();
	let config = BrokerConfig::from_lookup(|name| match name {
		"FYERS_APP_ID" => Some("APP1".into()),
		"FYERS_SECRET" => Some("SECRET1".into()),
		"FYERS_REDIRECT_URI" => Some("http://x/callback".into()),
		"FYERS_API_BASE" => Some(base_url.clone()),
		"FYERS_ACCESS_TOKEN" => Some("warm".into()),
		"FYERS_DEFAULT_SYMBOLS" => Some("NSE:INFY-EQ".into()),
		_ => None,
	})
	.expect("Configuration should be valid.");
	let broker = ReqwestBroker::from_config(&config).expect("Configured broker should build.");
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/data-rest/v3/quotes/")
				.query_param("symbols", "NSE:INFY-EQ")
				.header("authorization", "APP1:warm");
			then.status(200).header("content-type", "application/json").body("{\"s\":\"ok\"}");
		})
		.await;

	assert!(broker.is_authenticated().await.expect("Store should be readable."));

	broker.fetch_default_quotes().await.expect("Default quotes should be returned.");

	mock.assert_async().await;
}
