//! Application identity, redacted secrets, and token models.

pub mod identity;
pub mod secret;
pub mod token;

pub use identity::*;
pub use secret::*;
pub use token::*;
