//! Refresh-token rotation.
//!
//! The current refresh token is read under the grant guard, so a concurrent exchange cannot
//! pair its access token with a stale refresh token. The upstream may rotate the refresh token;
//! whatever the response carries replaces the stored pair.

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
	/// Mints a new token pair from the stored refresh token.
	///
	/// Fails fast with [`Error::NoRefreshToken`] (no network call) when none is held. On
	/// rejection the previous pair stays in place.
	pub async fn refresh(&self) -> Result<TokenGrant> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "refresh", self.environment());

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let _grant = self.grant_guard.lock().await;
				let refresh_token =
					self.store.load().await?.refresh_token.ok_or(Error::NoRefreshToken)?;

				self.identity.require_complete()?;

				let hash = self.identity.hash()?;

				common::redeem_grant(
					self,
					KIND,
					Operation::RefreshToken,
					GrantPayload::refresh_token(&hash, &refresh_token),
					|status, body| Error::Refresh { status, body },
				)
				.await
			})
			.await;

		common::record_result(KIND, &result);

		result
	}
}
