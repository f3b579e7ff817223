use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, warn};

use super::error::{ProviderError, ProviderResult};
use super::provider::EmbeddingProvider;

/// Retry budget for provider calls on a cache miss.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts per key, first call included.
    pub max_attempts: u32,
    /// Backoff before the first retry; doubles per subsequent retry.
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
        }
    }
}

/// Process-wide embedding cache keyed by exact folded text.
///
/// Entries are immutable once written and never invalidated within a run:
/// if a keyword's stored text is edited later, the new text is simply a new
/// key. A miss invokes the provider exactly once per key, however many
/// callers race on it — `moka`'s `try_get_with` coalesces concurrent misses
/// for the same key into a single in-flight call, while misses for distinct
/// keys proceed independently.
pub struct EmbeddingCache<P> {
    provider: Arc<P>,
    entries: Cache<String, Arc<Vec<f32>>>,
    retry: RetryPolicy,
}

impl<P> std::fmt::Debug for EmbeddingCache<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingCache")
            .field("entries", &self.entries.entry_count())
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl<P: EmbeddingProvider> EmbeddingCache<P> {
    pub const DEFAULT_CAPACITY: u64 = 10_000;

    pub fn new(provider: Arc<P>) -> Self {
        Self::with_capacity(provider, Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(provider: Arc<P>, capacity: u64) -> Self {
        Self {
            provider,
            entries: Cache::builder().max_capacity(capacity).build(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Returns the embedding for `text`, computing it on first sight.
    ///
    /// On miss the provider is called with bounded retries and exponential
    /// backoff; exhaustion surfaces [`ProviderError::Unavailable`] for this
    /// key only. Failed lookups are not cached, so a later call retries.
    pub async fn get(&self, text: &str) -> ProviderResult<Arc<Vec<f32>>> {
        let provider = Arc::clone(&self.provider);
        let retry = self.retry;
        let key = text.to_string();

        self.entries
            .try_get_with(key.clone(), async move {
                fetch_with_retry(provider.as_ref(), &key, retry).await
            })
            .await
            .map_err(|shared: Arc<ProviderError>| (*shared).clone())
    }

    /// Returns `true` if `text` is already cached (no provider call).
    pub fn contains(&self, text: &str) -> bool {
        self.entries.contains_key(text)
    }

    pub fn len(&self) -> u64 {
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.entry_count() == 0
    }

    /// Runs pending maintenance in the underlying cache. Entry counts are
    /// eventually consistent until this runs.
    pub async fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks().await;
    }
}

async fn fetch_with_retry<P: EmbeddingProvider + ?Sized>(
    provider: &P,
    text: &str,
    retry: RetryPolicy,
) -> ProviderResult<Arc<Vec<f32>>> {
    let mut backoff = retry.initial_backoff;
    let attempts = retry.max_attempts.max(1);
    let mut last_reason = String::new();

    for attempt in 1..=attempts {
        debug!(attempt, text_len = text.len(), "embedding cache miss, calling provider");
        match provider.embed(text).await {
            Ok(vector) => {
                let expected = provider.dimension();
                if expected != 0 && vector.len() != expected {
                    return Err(ProviderError::DimensionMismatch {
                        expected,
                        actual: vector.len(),
                    });
                }
                return Ok(Arc::new(vector));
            }
            Err(err) => {
                warn!(attempt, error = %err, "embedding provider call failed");
                last_reason = err.to_string();
                if attempt < attempts {
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                }
            }
        }
    }

    Err(ProviderError::Unavailable {
        attempts,
        reason: last_reason,
    })
}
