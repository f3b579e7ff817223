//! Embedding provider seam and the process-wide embedding cache.
//!
//! - [`EmbeddingProvider`] is the opaque external capability (text → vector).
//! - [`EmbeddingCache`] memoizes embeddings per folded keyword text with
//!   single-flight miss resolution and bounded retry.
//! - [`MockProvider`] (behind the `mock` feature) backs tests and examples.

mod cache;
mod error;
mod provider;

#[cfg(any(test, feature = "mock"))]
mod mock;


pub use cache::{EmbeddingCache, RetryPolicy};
pub use error::{ProviderError, ProviderResult};
pub use provider::EmbeddingProvider;

#[cfg(any(test, feature = "mock"))]
pub use mock::MockProvider;
