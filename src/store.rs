//! Storage contract and the built-in in-memory store for the broker's token pair.
//!
//! The broker is the only writer. External stores (secrets managers, databases) implement
//! [`TokenStore`] to survive restarts; the default [`MemoryStore`] lives for the process.

pub mod memory;

pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::TokenPair};

/// Boxed future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract for the single process-wide [`TokenPair`].
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Returns a snapshot of the current pair.
	fn load(&self) -> StoreFuture<'_, TokenPair>;

	/// Replaces both fields of the pair in one write.
	fn replace(&self, pair: TokenPair) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
