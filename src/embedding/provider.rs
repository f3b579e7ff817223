use async_trait::async_trait;

use super::error::ProviderResult;

/// External embedding capability: text in, fixed-length vector out.
///
/// Implementations must be deterministic for identical input within one
/// model version and produce the same dimension on every call. The engine
/// treats the provider as a black box; the only blocking operation in the
/// whole pipeline is this call.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + 'static {
    async fn embed(&self, text: &str) -> ProviderResult<Vec<f32>>;

    /// Embedding dimension this provider produces.
    fn dimension(&self) -> usize;
}
