use thiserror::Error;

/// Errors from the embedding provider and cache.
///
/// `Clone` because a single-flight miss shares one outcome between every
/// waiter on that key.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProviderError {
    /// A single provider call failed. The cache retries these before
    /// escalating to [`ProviderError::Unavailable`].
    #[error("embedding provider call failed: {reason}")]
    CallFailed { reason: String },

    /// The provider stayed unavailable through the retry budget. Scoped to
    /// one cache key; other keys proceed normally.
    #[error("embedding provider unavailable after {attempts} attempts: {reason}")]
    Unavailable { attempts: u32, reason: String },

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

pub type ProviderResult<T> = Result<T, ProviderError>;
