//! Mock embedding provider for tests and examples.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::error::{ProviderError, ProviderResult};
use super::provider::EmbeddingProvider;

/// Deterministic in-memory provider.
///
/// Texts registered via [`MockProvider::set_vector`] return exactly that
/// vector; anything else gets a hash-derived unit vector, so unrelated texts
/// score near zero against each other. Every call (including failures) bumps
/// an atomic counter, which tests use to assert cache hits and the
/// exact-match short-circuit.
pub struct MockProvider {
    dimension: usize,
    vectors: RwLock<HashMap<String, Vec<f32>>>,
    failing: RwLock<HashSet<String>>,
    calls: AtomicUsize,
}

impl MockProvider {
    pub const DEFAULT_DIMENSION: usize = 8;

    pub fn new() -> Self {
        Self::with_dimension(Self::DEFAULT_DIMENSION)
    }

    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: RwLock::new(HashMap::new()),
            failing: RwLock::new(HashSet::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Registers a fixed vector for a text. The vector is normalized to unit
    /// length so registered cosine scores are exactly the configured dot
    /// products.
    pub fn set_vector(&self, text: impl Into<String>, vector: Vec<f32>) {
        let mut vector = vector;
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        self.vectors.write().insert(text.into(), vector);
    }

    /// Registers a pair of unit vectors whose cosine similarity is exactly
    /// `similarity`.
    pub fn set_pair(&self, a: impl Into<String>, b: impl Into<String>, similarity: f32) {
        let mut base = vec![0.0; self.dimension];
        base[0] = 1.0;
        let mut other = vec![0.0; self.dimension];
        other[0] = similarity;
        other[1] = (1.0 - similarity * similarity).max(0.0).sqrt();
        self.set_vector(a, base);
        self.set_vector(b, other);
    }

    /// Makes subsequent calls for `text` fail.
    pub fn fail_on(&self, text: impl Into<String>) {
        self.failing.write().insert(text.into());
    }

    /// Clears a failure injection (e.g. to test retry-then-success).
    pub fn recover(&self, text: &str) {
        self.failing.write().remove(text);
    }

    /// Number of provider calls made so far, failures included.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fallback_vector(&self, text: &str) -> Vec<f32> {
        // FNV-1a over the text bytes seeds a cheap deterministic generator.
        let mut state: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in text.bytes() {
            state ^= u64::from(byte);
            state = state.wrapping_mul(0x0000_0100_0000_01b3);
        }

        let mut vector = Vec::with_capacity(self.dimension);
        for _ in 0..self.dimension {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            vector.push(((state % 2000) as f32 / 1000.0) - 1.0);
        }
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockProvider")
            .field("dimension", &self.dimension)
            .field("registered", &self.vectors.read().len())
            .field("calls", &self.call_count())
            .finish()
    }
}

#[async_trait]
impl EmbeddingProvider for MockProvider {
    async fn embed(&self, text: &str) -> ProviderResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.failing.read().contains(text) {
            return Err(ProviderError::CallFailed {
                reason: format!("injected failure for {text:?}"),
            });
        }

        let registered = self.vectors.read().get(text).cloned();
        Ok(registered.unwrap_or_else(|| self.fallback_vector(text)))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
