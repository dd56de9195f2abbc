//! Grant labels sent in token-endpoint payloads.

// self
use crate::_prelude::*;

/// OAuth grant types accepted by the Fyers token endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
	/// Authorization Code grant, issued after the user logs in.
	AuthorizationCode,
	/// Refresh Token grant for minting a new access token without re-login.
	RefreshToken,
}
impl GrantType {
	/// Returns the wire identifier for the grant type.
	pub fn as_str(self) -> &'static str {
		match self {
			GrantType::AuthorizationCode => "authorization_code",
			GrantType::RefreshToken => "refresh_token",
		}
	}
}
impl Display for GrantType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
