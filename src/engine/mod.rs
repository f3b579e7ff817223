//! Match engine: orchestrates normalization, the question store, and the
//! similarity matcher into per-question verdict streams.

mod error;

#[cfg(test)]
mod tests;

pub use error::{EngineError, EngineResult};

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{debug, instrument};

use crate::config::MatchConfig;
use crate::embedding::{EmbeddingCache, EmbeddingProvider};
use crate::matcher::{MatchVerdict, SimilarityMatcher};
use crate::normalize::normalize;
use crate::store::{QuestionId, QuestionStore, Worksheet};

/// Raw extracted answers for one worksheet, keyed by question id. Produced
/// by the external report-extraction collaborator.
pub type AnswerMap = HashMap<QuestionId, String>;

/// Outcome of verifying one worksheet. `CorruptOrdering` makes the whole
/// worksheet unverifiable, so the verdicts sit behind a `Result`.
#[derive(Debug)]
pub struct WorksheetReport {
    pub worksheet: Worksheet,
    pub verdicts: EngineResult<Vec<MatchVerdict>>,
}

/// Verdict producer for supplier reports.
///
/// Holds the shared [`QuestionStore`] and the embedding cache; one engine is
/// built per process/run and shared across worker tasks (all its methods
/// take `&self`). The matching workload is embarrassingly parallel across
/// worksheets — the only synchronization point is the embedding cache.
pub struct MatchEngine<P> {
    store: QuestionStore,
    matcher: SimilarityMatcher<P>,
}

impl<P> std::fmt::Debug for MatchEngine<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchEngine")
            .field("store", &self.store)
            .field("matcher", &self.matcher)
            .finish()
    }
}

impl<P: EmbeddingProvider> MatchEngine<P> {
    pub fn new(store: QuestionStore, provider: Arc<P>, config: &MatchConfig) -> Self {
        let cache = EmbeddingCache::with_capacity(provider, config.cache_capacity).with_retry(
            crate::embedding::RetryPolicy {
                max_attempts: config.max_retries,
                initial_backoff: config.retry_backoff,
            },
        );
        Self {
            store,
            matcher: SimilarityMatcher::new(Arc::new(cache), config.similarity_threshold),
        }
    }

    /// Builds an engine around an existing cache (shared across engines).
    pub fn with_cache(store: QuestionStore, cache: Arc<EmbeddingCache<P>>, threshold: f32) -> Self {
        Self {
            store,
            matcher: SimilarityMatcher::new(cache, threshold),
        }
    }

    pub fn store(&self) -> &QuestionStore {
        &self.store
    }

    pub fn matcher(&self) -> &SimilarityMatcher<P> {
        &self.matcher
    }

    /// Verifies one worksheet: walks questions in store order, normalizes
    /// each raw answer, and matches it against the question's current
    /// keyword set. Verdict order equals traversal order.
    ///
    /// A question without a raw answer yields a no-match verdict without
    /// invoking the matcher. The returned future never mutates the store,
    /// so dropping it between questions (cancellation) is always safe.
    #[instrument(skip(self, answers), fields(worksheet = %worksheet))]
    pub async fn verify_worksheet(
        &self,
        worksheet: &Worksheet,
        answers: &AnswerMap,
    ) -> EngineResult<Vec<MatchVerdict>> {
        let questions = self.store.list_ordered(worksheet)?;
        debug!(questions = questions.len(), "verifying worksheet");

        let mut verdicts = Vec::with_capacity(questions.len());
        for question in &questions {
            let verdict = match answers.get(&question.id) {
                None => MatchVerdict::no_match(question.id, 0.0),
                Some(raw) => {
                    let candidate = normalize(raw);
                    let expected = self.store.keywords(question.id)?;
                    self.matcher
                        .match_candidate(question.id, &candidate, &expected)
                        .await
                }
            };
            verdicts.push(verdict);
        }
        Ok(verdicts)
    }

    /// Verifies several worksheets concurrently. Reports come back in input
    /// order; a corrupt worksheet fails its own report without affecting
    /// the others.
    pub async fn verify_report(
        &self,
        worksheets: &[(Worksheet, AnswerMap)],
    ) -> Vec<WorksheetReport> {
        let futures = worksheets.iter().map(|(worksheet, answers)| async move {
            WorksheetReport {
                worksheet: worksheet.clone(),
                verdicts: self.verify_worksheet(worksheet, answers).await,
            }
        });
        join_all(futures).await
    }
}
