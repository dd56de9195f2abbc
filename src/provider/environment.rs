//! Environment classification from the configured API base URL.

// self
use crate::_prelude::*;

const TEST_HOST_MARKER: &str = "api-t1.fyers.in";

/// Variant of the Fyers API selected by the configured base URL.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiEnvironment {
	/// Sandbox host; uses the `validate-*` endpoint family.
	Test,
	/// Live host; uses the `token` endpoint family.
	Production,
}
impl ApiEnvironment {
	/// Classifies an API base URL; `test` iff it contains `api-t1.fyers.in` in any case.
	pub fn classify(api_base: &str) -> Self {
		if api_base.to_ascii_lowercase().contains(TEST_HOST_MARKER) {
			Self::Test
		} else {
			Self::Production
		}
	}

	/// Returns true for the `validate-*` endpoint family.
	pub const fn uses_validate_flow(self) -> bool {
		matches!(self, Self::Test)
	}

	/// Returns a stable label suitable for health output, span fields, or metrics.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Test => "test",
			Self::Production => "production",
		}
	}
}
impl Display for ApiEnvironment {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
