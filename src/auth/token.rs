//! Token pair state and the grant returned by exchange/refresh calls.

// self
use crate::{_prelude::*, auth::Secret};

/// Process-wide authentication state held by the token store.
///
/// Both fields are replaced together by every successful exchange or refresh, including with
/// `None` when the upstream response omitted one of them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
	/// Short-lived credential authorizing quote requests.
	pub access_token: Option<Secret>,
	/// Longer-lived credential used to mint a new access token.
	pub refresh_token: Option<Secret>,
}
impl TokenPair {
	/// Creates a pair from optional raw token strings; empty strings count as absent.
	pub fn new(access_token: Option<String>, refresh_token: Option<String>) -> Self {
		Self {
			access_token: access_token.filter(|v| !v.trim().is_empty()).map(Secret::new),
			refresh_token: refresh_token.filter(|v| !v.trim().is_empty()).map(Secret::new),
		}
	}

	/// Returns true when an access token is held.
	pub fn is_authenticated(&self) -> bool {
		self.access_token.is_some()
	}
}

/// Outcome of a successful exchange or refresh.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenGrant {
	/// Access token returned by the upstream, if any.
	pub access_token: Option<Secret>,
	/// Refresh token returned by the upstream, if any (may be rotated).
	pub refresh_token: Option<Secret>,
	/// Lifetime reported through `expires_in`, when present and positive.
	pub expires_in: Option<Duration>,
	/// Instant the broker received the grant.
	pub issued_at: OffsetDateTime,
}
impl TokenGrant {
	/// Pair stored in the token store for this grant.
	pub fn pair(&self) -> TokenPair {
		TokenPair {
			access_token: self.access_token.clone(),
			refresh_token: self.refresh_token.clone(),
		}
	}

	/// Absolute expiry derived from `issued_at + expires_in`.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		self.expires_in.map(|lifetime| self.issued_at + lifetime)
	}
}
