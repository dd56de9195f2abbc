//! Authenticated quote fetches.
//!
//! The access token is read without taking the grant guard: a token invalidated mid-flight
//! simply produces an upstream rejection. Any status of 400 or above is a failure even though
//! the transport call succeeded, so callers can inspect the structured error body.

// self
use crate::{
	_prelude::*,
	api::{self, TransportErrorMapper},
	flows::{Broker, common},
	http::ApiHttpClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

impl<C, M> Broker<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Fetches quotes for `symbols` with a single authenticated `GET`.
	pub async fn fetch_quotes<S>(&self, symbols: &[S]) -> Result<serde_json::Value>
	where
		S: AsRef<str>,
	{
		const KIND: FlowKind = FlowKind::Quotes;

		let span = FlowSpan::new(KIND, "fetch_quotes", self.environment());
		let symbols = symbols
			.iter()
			.map(|symbol| symbol.as_ref().trim())
			.filter(|symbol| !symbol.is_empty())
			.map(str::to_owned)
			.collect::<Vec<_>>();

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				if symbols.is_empty() {
					return Err(Error::EmptySymbols);
				}

				self.identity.require_complete()?;

				let access_token =
					self.store.load().await?.access_token.ok_or(Error::Unauthenticated)?;
				let url = self.endpoints.quotes_url(symbols.as_slice())?;
				let request = api::quotes_request(&url, self.identity.app_id()?, &access_token)?;
				let response = api::send(
					self.http_client.as_ref(),
					self.transport_mapper.as_ref(),
					KIND,
					request,
				)
				.await?;

				tracing::debug!(
					symbols = symbols.len(),
					status = response.status,
					"Quotes answered."
				);

				if response.status >= 400 {
					return Err(Error::QuoteFetch {
						status: response.status,
						body: response.body_text(),
					});
				}

				response.json()
			})
			.await;

		common::record_result(KIND, &result);

		result
	}

	/// Fetches quotes for the broker's default symbol list.
	pub async fn fetch_default_quotes(&self) -> Result<serde_json::Value> {
		self.fetch_quotes(self.default_symbols.as_slice()).await
	}
}
