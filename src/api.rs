//! Wire-level calls to the Fyers REST API.
//!
//! Grant requests are JSON `POST`s carrying `grant_type`, `appIdHash`, and either `code` or
//! `refresh_token`; quote requests are `GET`s authorized with the broker-specific
//! `"{app_id}:{access_token}"` header (not a bearer token). Responses are returned as raw
//! status + body so each flow can apply its own success rule.

// crates.io
use oauth2::{
	AsyncHttpClient, HttpClientError, HttpRequest,
	http::{
		Method, Request,
		header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
	},
};
// self
use crate::{
	_prelude::*,
	auth::{AppIdHash, Secret, TokenGrant},
	error::{ConfigError, TransportError},
	http::{ApiHttpClient, ResponseMetadata, ResponseMetadataSlot},
	obs::FlowKind,
	provider::GrantType,
};

const JSON: &str = "application/json";

/// Maps HTTP transport failures into broker [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a broker error.
	fn map_transport_error(
		&self,
		flow: FlowKind,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		flow: FlowKind,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(flow, meta, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => TransportError::Other { message }.into(),
			_ => TransportError::Other { message: "unrecognized client failure".into() }.into(),
		}
	}
}

/// Success envelope returned by the token endpoints.
///
/// Every field is optional: a 2xx response replaces the stored pair with whatever it carried.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TokenEnvelope {
	/// Newly issued access token.
	pub access_token: Option<String>,
	/// Newly issued (possibly rotated) refresh token.
	pub refresh_token: Option<String>,
	/// Access token lifetime in seconds.
	pub expires_in: Option<i64>,
	/// Fyers status marker (`ok` / `error`).
	pub s: Option<String>,
	/// Fyers human-readable message.
	pub message: Option<String>,
}
impl TokenEnvelope {
	/// Upstream message when the envelope reports `s == "error"`.
	pub fn error_message(&self) -> Option<&str> {
		self.s
			.as_deref()
			.filter(|status| *status == "error")
			.map(|_| self.message.as_deref().unwrap_or("unspecified"))
	}

	/// Converts the envelope into a grant stamped at `issued_at`.
	pub fn into_grant(self, issued_at: OffsetDateTime) -> TokenGrant {
		TokenGrant {
			access_token: self.access_token.map(Secret::new),
			refresh_token: self.refresh_token.map(Secret::new),
			expires_in: self.expires_in.filter(|secs| *secs > 0).map(Duration::seconds),
			issued_at,
		}
	}
}
impl Debug for TokenEnvelope {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenEnvelope")
			.field("access_token_set", &self.access_token.is_some())
			.field("refresh_token_set", &self.refresh_token.is_some())
			.field("expires_in", &self.expires_in)
			.field("s", &self.s)
			.field("message", &self.message)
			.finish()
	}
}

/// JSON body shared by the exchange and refresh grants.
#[derive(Serialize)]
pub(crate) struct GrantPayload<'a> {
	grant_type: GrantType,
	#[serde(rename = "appIdHash")]
	app_id_hash: &'a str,
	#[serde(skip_serializing_if = "Option::is_none")]
	code: Option<&'a str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	refresh_token: Option<&'a str>,
}
impl<'a> GrantPayload<'a> {
	pub(crate) fn authorization_code(hash: &'a AppIdHash, code: &'a str) -> Self {
		Self {
			grant_type: GrantType::AuthorizationCode,
			app_id_hash: hash.expose(),
			code: Some(code),
			refresh_token: None,
		}
	}

	pub(crate) fn refresh_token(hash: &'a AppIdHash, refresh_token: &'a Secret) -> Self {
		Self {
			grant_type: GrantType::RefreshToken,
			app_id_hash: hash.expose(),
			code: None,
			refresh_token: Some(refresh_token.expose()),
		}
	}
}

/// Raw upstream answer: status plus undecoded body.
#[derive(Clone, Debug)]
pub(crate) struct UpstreamResponse {
	pub(crate) status: u16,
	pub(crate) body: Vec<u8>,
}
impl UpstreamResponse {
	pub(crate) fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	pub(crate) fn body_text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}

	pub(crate) fn token_envelope(&self) -> Result<TokenEnvelope> {
		self.decode()
	}

	/// Fyers `message` field of an error envelope, if the body carries one.
	pub(crate) fn upstream_message(&self) -> Option<String> {
		let envelope = self.token_envelope().ok()?;

		envelope.message.filter(|_| envelope.s.as_deref() != Some("ok"))
	}

	pub(crate) fn json(&self) -> Result<serde_json::Value> {
		self.decode()
	}

	fn decode<T>(&self) -> Result<T>
	where
		T: for<'de> Deserialize<'de>,
	{
		let de = &mut serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(de)
			.map_err(|source| Error::ResponseParse { source, status: self.status })
	}
}

/// Builds the JSON `POST` for a grant request.
pub(crate) fn grant_request(url: &Url, payload: &GrantPayload) -> Result<HttpRequest> {
	let body = serde_json::to_vec(payload).map_err(ConfigError::PayloadEncode)?;
	let request = Request::builder()
		.method(Method::POST)
		.uri(url.as_str())
		.header(CONTENT_TYPE, JSON)
		.header(ACCEPT, JSON)
		.body(body)
		.map_err(ConfigError::from)?;

	Ok(request)
}

/// Builds the authorized `GET` for a quotes request.
pub(crate) fn quotes_request(
	url: &Url,
	app_id: &str,
	access_token: &Secret,
) -> Result<HttpRequest> {
	let request = Request::builder()
		.method(Method::GET)
		.uri(url.as_str())
		.header(AUTHORIZATION, format!("{app_id}:{}", access_token.expose()))
		.header(ACCEPT, JSON)
		.body(Vec::new())
		.map_err(ConfigError::from)?;

	Ok(request)
}

/// Sends one request through the transport; no retries.
pub(crate) async fn send<C, M>(
	http_client: &C,
	mapper: &M,
	flow: FlowKind,
	request: HttpRequest,
) -> Result<UpstreamResponse>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	let slot = ResponseMetadataSlot::default();
	let handle = http_client.with_metadata(slot.clone());
	let response = handle
		.call(request)
		.await
		.map_err(|err| mapper.map_transport_error(flow, slot.take().as_ref(), err))?;
	let status = response.status().as_u16();

	Ok(UpstreamResponse { status, body: response.into_body() })
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(flow: FlowKind, meta: Option<&ResponseMetadata>, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}

	tracing::debug!(
		flow = flow.as_str(),
		status = meta.and_then(|value| value.status),
		timeout = err.is_timeout(),
		"Fyers API call failed in transport."
	);

	TransportError::from(err).into()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::ApplicationIdentity;

	fn hash() -> AppIdHash {
		ApplicationIdentity::new("A", "B", "http://x/callback")
			.hash()
			.expect("Fixture should hash.")
	}

	#[test]
	fn authorization_code_payload_matches_wire_shape() {
		let hash = hash();
		let payload = serde_json::to_string(&GrantPayload::authorization_code(&hash, "code-1"))
			.expect("Payload should serialize.");

		assert_eq!(
			payload,
			"{\"grant_type\":\"authorization_code\",\"appIdHash\":\"5a33e15dd84ada6f7025d197d544db12e7aaf1cda1afee27561584de010f0921\",\"code\":\"code-1\"}"
		);
	}

	#[test]
	fn refresh_payload_matches_wire_shape() {
		let hash = hash();
		let refresh = Secret::new("r-1");
		let value = serde_json::to_value(GrantPayload::refresh_token(&hash, &refresh))
			.expect("Payload should serialize.");

		assert_eq!(value["grant_type"], "refresh_token");
		assert_eq!(value["refresh_token"], "r-1");
		assert!(value.get("code").is_none());
	}

	#[test]
	fn quotes_request_uses_broker_authorization_scheme() {
		let url = Url::parse("https://api.fyers.in/data-rest/v3/quotes/?symbols=NSE%3ASBIN-EQ")
			.expect("Fixture URL should parse.");
		let request = quotes_request(&url, "APP1", &Secret::new("tok"))
			.expect("Quotes request should build.");

		assert_eq!(request.method(), Method::GET);
		assert_eq!(
			request.headers().get(AUTHORIZATION).and_then(|value| value.to_str().ok()),
			Some("APP1:tok")
		);
	}

	#[test]
	fn token_envelope_tolerates_missing_fields() {
		let response = UpstreamResponse {
			status: 200,
			body: br#"{"s":"ok","access_token":"a"}"#.to_vec(),
		};
		let grant = response
			.token_envelope()
			.expect("Partial envelope should decode.")
			.into_grant(OffsetDateTime::UNIX_EPOCH);

		assert_eq!(grant.access_token.as_ref().map(Secret::expose), Some("a"));
		assert!(grant.refresh_token.is_none());
		assert!(grant.expires_in.is_none());
	}

	#[test]
	fn error_envelope_exposes_message() {
		let rejected = UpstreamResponse {
			status: 401,
			body: br#"{"s":"error","code":-16,"message":"invalid auth code"}"#.to_vec(),
		};
		let envelope = rejected.token_envelope().expect("Error envelope should decode.");

		assert_eq!(envelope.error_message(), Some("invalid auth code"));
		assert_eq!(rejected.upstream_message().as_deref(), Some("invalid auth code"));

		let accepted = UpstreamResponse {
			status: 200,
			body: br#"{"s":"ok","message":"","access_token":"a"}"#.to_vec(),
		};

		let envelope = accepted.token_envelope().expect("Envelope should decode.");

		assert!(envelope.error_message().is_none());
		assert!(accepted.upstream_message().is_none());

		let html = UpstreamResponse { status: 502, body: b"<html>".to_vec() };

		assert!(html.upstream_message().is_none());
	}

	#[test]
	fn malformed_body_reports_status() {
		let response = UpstreamResponse { status: 200, body: b"<html>".to_vec() };
		let err = response.json().expect_err("HTML should not decode as JSON.");

		assert!(matches!(err, Error::ResponseParse { status: 200, .. }));
	}

	#[test]
	fn envelope_debug_hides_tokens() {
		let envelope = TokenEnvelope {
			access_token: Some("a-secret".into()),
			refresh_token: Some("r-secret".into()),
			..Default::default()
		};
		let rendered = format!("{envelope:?}");

		assert!(!rendered.contains("a-secret"));
		assert!(!rendered.contains("r-secret"));
	}
}
