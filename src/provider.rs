//! Fyers API routing: environment classification, endpoint resolution, and grant labels.
//!
//! `environment` decides between the `test` (validate flow) and `production` (token flow)
//! variants from the configured API base URL. `endpoints` turns that decision into concrete URLs
//! for every operation the broker performs.

pub mod endpoints;
pub mod environment;
pub mod grant;

pub use endpoints::*;
pub use environment::*;
pub use grant::*;
