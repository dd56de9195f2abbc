//! Shared helpers for the grant flows (request dispatch, store rotation, outcome recording).

// self
use crate::{
	_prelude::*,
	api::{self, GrantPayload, TransportErrorMapper},
	auth::TokenGrant,
	flows::Broker,
	http::ApiHttpClient,
	obs::{self, FlowKind, FlowOutcome},
	provider::Operation,
};

/// Posts a grant, then replaces the stored pair with whatever a 2xx response carried.
///
/// The caller must hold the broker's grant guard. Rejections leave the store untouched and are
/// turned into flow-specific errors by `reject`.
pub(crate) async fn redeem_grant<C, M>(
	broker: &Broker<C, M>,
	kind: FlowKind,
	operation: Operation,
	payload: GrantPayload<'_>,
	reject: fn(u16, String) -> Error,
) -> Result<TokenGrant>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	let url = broker.endpoints.resolve(operation)?;
	let request = api::grant_request(&url, &payload)?;
	let response =
		api::send(broker.http_client.as_ref(), broker.transport_mapper.as_ref(), kind, request)
			.await?;

	if !response.is_success() {
		let upstream_message = response.upstream_message();

		tracing::warn!(
			status = response.status,
			upstream_message = upstream_message.as_deref(),
			"Fyers rejected the grant."
		);

		return Err(reject(response.status, response.body_text()));
	}

	let envelope = response.token_envelope()?;

	if let Some(upstream_message) = envelope.error_message() {
		tracing::warn!(
			status = response.status,
			upstream_message,
			"Fyers flagged a successful grant response as an error."
		);
	}

	let grant = envelope.into_grant(OffsetDateTime::now_utc());

	broker.store.replace(grant.pair()).await?;

	tracing::info!(
		access_token_issued = grant.access_token.is_some(),
		refresh_token_issued = grant.refresh_token.is_some(),
		expires_in_secs = grant.expires_in.map(|lifetime| lifetime.whole_seconds()),
		"Token pair replaced."
	);

	Ok(grant)
}

/// Records the final outcome of a flow.
pub(crate) fn record_result<T>(kind: FlowKind, result: &Result<T>) {
	match result {
		Ok(_) => obs::record_flow_outcome(kind, FlowOutcome::Success),
		Err(err) => {
			tracing::debug!(flow = kind.as_str(), error = %err, "Flow failed.");
			obs::record_flow_outcome(kind, FlowOutcome::Failure);
		},
	}
}
