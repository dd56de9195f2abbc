//! Authorization-code exchange.
//!
//! The code is single-use, so the exchange is attempted exactly once; any rejection leaves the
//! stored pair untouched and reports the upstream status and body.

// self
use crate::{
	_prelude::*,
	api::{GrantPayload, TransportErrorMapper},
	auth::TokenGrant,
	flows::{Broker, common},
	http::ApiHttpClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::Operation,
};

impl<C, M> Broker<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Exchanges an authorization code for a token pair and stores it.
	pub async fn exchange(&self, code: &str) -> Result<TokenGrant> {
		const KIND: FlowKind = FlowKind::AuthorizationCode;

		let span = FlowSpan::new(KIND, "exchange", self.environment());

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let code = code.trim();

				if code.is_empty() {
					return Err(Error::MissingAuthorizationCode);
				}

				self.identity.require_complete()?;

				let hash = self.identity.hash()?;
				let _grant = self.grant_guard.lock().await;

				common::redeem_grant(
					self,
					KIND,
					Operation::ExchangeToken,
					GrantPayload::authorization_code(&hash, code),
					|status, body| Error::TokenExchange { status, body },
				)
				.await
			})
			.await;

		common::record_result(KIND, &result);

		result
	}
}
