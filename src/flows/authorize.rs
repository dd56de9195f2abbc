//! Authorization URL construction and redirect handling.

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{
	_prelude::*,
	api::TransportErrorMapper,
	auth::TokenGrant,
	flows::Broker,
	http::ApiHttpClient,
	obs::{FlowKind, FlowSpan},
};

const STATE_LEN: usize = 32;

/// Login URL paired with the anti-forgery `state` it carries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationRequest {
	/// Opaque state value that must round-trip via the redirect handler.
	pub state: String,
	/// Fully-formed login URL the user should be sent to.
	pub url: Url,
}
impl AuthorizationRequest {
	/// Validates the `state` returned by the redirect.
	pub fn validate_state(&self, returned_state: &str) -> Result<()> {
		if returned_state == self.state { Ok(()) } else { Err(Error::StateMismatch) }
	}
}

/// Query parameters delivered to the redirect URI.
///
/// Fyers sends the code as `auth_code`; some integrations forward it as `code`.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AuthorizationCallback {
	/// Code under the Fyers parameter name.
	pub auth_code: Option<String>,
	/// Code under the generic OAuth parameter name.
	pub code: Option<String>,
	/// State echoed back by the broker.
	pub state: Option<String>,
}
impl AuthorizationCallback {
	/// Code to exchange, preferring `auth_code` over `code`; blank values are ignored.
	pub fn effective_code(&self) -> Option<&str> {
		[self.auth_code.as_deref(), self.code.as_deref()]
			.into_iter()
			.flatten()
			.map(str::trim)
			.find(|value| !value.is_empty())
	}
}
impl Debug for AuthorizationCallback {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationCallback")
			.field("auth_code_set", &self.auth_code.is_some())
			.field("code_set", &self.code.is_some())
			.field("state", &self.state)
			.finish()
	}
}

impl<C, M> Broker<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Builds the login URL for a caller-supplied `state`; pure and deterministic.
	pub fn build_authorization_url(&self, state: &str) -> Result<Url> {
		let environment = self.environment();
		let _span =
			FlowSpan::new(FlowKind::AuthorizationCode, "build_authorization_url", environment)
				.entered();
		let client_id = self.identity.app_id()?;
		let redirect_uri = self.identity.redirect_uri()?;

		Ok(self.endpoints.authorize_url(client_id, redirect_uri, state)?)
	}

	/// Builds the login URL with a freshly generated random `state`.
	pub fn start_authorization(&self) -> Result<AuthorizationRequest> {
		let state = random_state();
		let url = self.build_authorization_url(&state)?;

		Ok(AuthorizationRequest { state, url })
	}

	/// Validates the redirect (when `expected_state` is given) and exchanges its code.
	pub async fn complete_authorization(
		&self,
		callback: &AuthorizationCallback,
		expected_state: Option<&str>,
	) -> Result<TokenGrant> {
		if expected_state.is_some_and(|expected| callback.state.as_deref() != Some(expected)) {
			tracing::warn!("Authorization callback carried an unexpected state.");

			return Err(Error::StateMismatch);
		}

		let code = callback.effective_code().ok_or(Error::MissingAuthorizationCode)?;

		self.exchange(code).await
	}
}

fn random_state() -> String {
	rand::rng().sample_iter(Alphanumeric).take(STATE_LEN).map(char::from).collect()
}
