//! Thread-safe in-memory [`TokenStore`] implementation.

// self
use crate::{
	_prelude::*,
	auth::TokenPair,
	store::{StoreFuture, TokenStore},
};

/// Process-local store guarding the pair behind a single lock.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Arc<RwLock<TokenPair>>);
impl MemoryStore {
	/// Creates a store pre-populated with tokens (warm start).
	pub fn seeded(pair: TokenPair) -> Self {
		Self(Arc::new(RwLock::new(pair)))
	}

	/// Returns the current pair without going through the async contract.
	pub fn snapshot(&self) -> TokenPair {
		self.0.read().clone()
	}
}
impl TokenStore for MemoryStore {
	fn load(&self) -> StoreFuture<'_, TokenPair> {
		let pair = self.snapshot();

		Box::pin(async move { Ok(pair) })
	}

	fn replace(&self, pair: TokenPair) -> StoreFuture<'_, ()> {
		let cell = self.0.clone();

		Box::pin(async move {
			*cell.write() = pair;

			Ok(())
		})
	}
}
