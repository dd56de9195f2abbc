//! Fixed application identity and the credential hash the Fyers token endpoints expect.

// crates.io
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, auth::Secret, error::ConfigError};

/// Broker-assigned client identity, immutable for the process lifetime.
///
/// Empty or whitespace-only values are treated as absent and anything else is kept verbatim, so a
/// partially configured identity can still be constructed (health checks keep working) while
/// every network operation reports the gap as [`ConfigError::MissingField`].
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ApplicationIdentity {
	app_id: Option<String>,
	secret: Option<Secret>,
	redirect_uri: Option<String>,
	precomputed_hash: Option<AppIdHash>,
}
impl ApplicationIdentity {
	/// Creates an identity from the three static settings.
	pub fn new(
		app_id: impl Into<String>,
		secret: impl Into<String>,
		redirect_uri: impl Into<String>,
	) -> Self {
		Self {
			app_id: normalize(app_id.into()),
			secret: normalize(secret.into()).map(Secret::new),
			redirect_uri: normalize(redirect_uri.into()),
			precomputed_hash: None,
		}
	}

	/// Builds an identity from optional settings, as read from the environment.
	pub fn from_parts(
		app_id: Option<String>,
		secret: Option<String>,
		redirect_uri: Option<String>,
	) -> Self {
		Self {
			app_id: app_id.and_then(normalize),
			secret: secret.and_then(normalize).map(Secret::new),
			redirect_uri: redirect_uri.and_then(normalize),
			precomputed_hash: None,
		}
	}

	/// Uses an operator-supplied hash instead of deriving one from the secret.
	pub fn with_precomputed_hash(mut self, hash: impl Into<String>) -> Self {
		self.precomputed_hash = normalize(hash.into()).map(AppIdHash);

		self
	}

	/// Client identifier, or [`ConfigError::MissingField`] when absent.
	pub fn app_id(&self) -> Result<&str, ConfigError> {
		self.app_id.as_deref().ok_or(ConfigError::MissingField { field: "app_id" })
	}

	/// Confidential client secret, or [`ConfigError::MissingField`] when absent.
	pub fn secret(&self) -> Result<&Secret, ConfigError> {
		self.secret.as_ref().ok_or(ConfigError::MissingField { field: "secret" })
	}

	/// Redirect URI registered with the broker, or [`ConfigError::MissingField`] when absent.
	pub fn redirect_uri(&self) -> Result<&str, ConfigError> {
		self.redirect_uri.as_deref().ok_or(ConfigError::MissingField { field: "redirect_uri" })
	}

	/// Names of the settings that are still absent.
	pub fn missing_fields(&self) -> Vec<&'static str> {
		let mut missing = Vec::new();

		if self.app_id.is_none() {
			missing.push("app_id");
		}
		if self.secret.is_none() && self.precomputed_hash.is_none() {
			missing.push("secret");
		}
		if self.redirect_uri.is_none() {
			missing.push("redirect_uri");
		}

		missing
	}

	/// Returns true when every network operation can be attempted.
	pub fn is_complete(&self) -> bool {
		self.missing_fields().is_empty()
	}

	/// Fails with the first missing field, if any.
	pub fn require_complete(&self) -> Result<(), ConfigError> {
		match self.missing_fields().first() {
			Some(&field) => Err(ConfigError::MissingField { field }),
			None => Ok(()),
		}
	}

	/// Returns the application-identity hash sent to the token endpoints.
	///
	/// A precomputed hash wins; otherwise the hash is derived from `app_id` and `secret`, both
	/// of which must be present.
	pub fn hash(&self) -> Result<AppIdHash, ConfigError> {
		if let Some(hash) = &self.precomputed_hash {
			return Ok(hash.clone());
		}

		Ok(AppIdHash::derive(self.app_id()?, self.secret()?.expose()))
	}
}
impl Debug for ApplicationIdentity {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApplicationIdentity")
			.field("app_id", &self.app_id)
			.field("redirect_uri", &self.redirect_uri)
			.field("secret_set", &self.secret.is_some())
			.field("precomputed_hash_set", &self.precomputed_hash.is_some())
			.finish()
	}
}

/// Lowercase hex SHA-256 of `"{app_id}:{secret}"`.
///
/// Formatting is redacted; use [`AppIdHash::expose`] only when writing the request payload.
#[derive(Clone, PartialEq, Eq)]
pub struct AppIdHash(String);
impl AppIdHash {
	/// Derives the hash from the client identifier and secret.
	pub fn derive(app_id: &str, secret: &str) -> Self {
		let mut hasher = Sha256::new();

		hasher.update(app_id.as_bytes());
		hasher.update(b":");
		hasher.update(secret.as_bytes());

		Self(format!("{:x}", hasher.finalize()))
	}

	/// Returns the hex digest. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl Debug for AppIdHash {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("AppIdHash").field(&"<redacted>").finish()
	}
}
impl Display for AppIdHash {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

fn normalize(value: String) -> Option<String> {
	if value.trim().is_empty() { None } else { Some(value) }
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn hash_matches_known_fixture() {
		let hash = ApplicationIdentity::new("A", "B", "http://x/callback")
			.hash()
			.expect("Complete identity should hash.");

		assert_eq!(
			hash.expose(),
			"5a33e15dd84ada6f7025d197d544db12e7aaf1cda1afee27561584de010f0921"
		);
	}

	#[test]
	fn hash_is_stable_lowercase_hex() {
		let identity = ApplicationIdentity::new("APP1", "SECRET1", "http://x/callback");
		let first = identity.hash().expect("Identity should hash.");
		let second = identity.hash().expect("Identity should hash again.");

		assert_eq!(first, second);
		assert_eq!(first.expose().len(), 64);
		assert!(first.expose().chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
		assert_eq!(
			first.expose(),
			"c19663949d64d55bc2587a38137f159a6ce3ea63c4e16aeee48e4eb8294bcce3"
		);
	}

	#[test]
	fn hash_requires_app_id_and_secret() {
		let err = ApplicationIdentity::new("", "B", "http://x/callback")
			.hash()
			.expect_err("Missing app id should fail.");

		assert!(matches!(err, ConfigError::MissingField { field: "app_id" }));

		let err = ApplicationIdentity::new("A", "   ", "http://x/callback")
			.hash()
			.expect_err("Whitespace secret should count as missing.");

		assert!(matches!(err, ConfigError::MissingField { field: "secret" }));
	}

	#[test]
	fn hash_covers_values_verbatim() {
		let padded = ApplicationIdentity::new("A", " B ", "http://x/callback")
			.hash()
			.expect("Padded secret should hash.");

		assert_eq!(padded, AppIdHash::derive("A", " B "));
		assert_ne!(padded, AppIdHash::derive("A", "B"));
		assert_eq!(
			padded.expose(),
			"2bd2af4a232dede81030e993eec3e77877c00de9ff2483c141e51f08fa08a0b1"
		);
	}

	#[test]
	fn precomputed_hash_skips_the_secret() {
		let identity = ApplicationIdentity::from_parts(
			Some("A".into()),
			None,
			Some("http://x/callback".into()),
		)
		.with_precomputed_hash("feedface");

		assert_eq!(identity.hash().expect("Override should be returned.").expose(), "feedface");
		assert!(identity.is_complete());
	}

	#[test]
	fn missing_fields_are_reported_in_order() {
		let identity = ApplicationIdentity::from_parts(None, None, None);

		assert_eq!(identity.missing_fields(), vec!["app_id", "secret", "redirect_uri"]);
		assert!(matches!(
			identity.require_complete(),
			Err(ConfigError::MissingField { field: "app_id" })
		));
	}

	#[test]
	fn debug_output_hides_secret_material() {
		let identity = ApplicationIdentity::new("APP1", "SECRET1", "http://x/callback");
		let rendered = format!("{identity:?}");
		let hash = identity.hash().expect("Identity should hash.");

		assert!(!rendered.contains("SECRET1"));
		assert!(rendered.contains("APP1"));
		assert_eq!(format!("{hash:?}"), "AppIdHash(\"<redacted>\")");
		assert_eq!(format!("{hash}"), "<redacted>");
	}
}
