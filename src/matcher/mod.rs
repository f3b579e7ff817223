//! Similarity matching: exact first, then embedding cosine similarity.

mod types;


pub use types::{MatchKind, MatchVerdict, MatchedKeyword};

use std::sync::Arc;

use tracing::debug;

use crate::embedding::{EmbeddingCache, EmbeddingProvider, ProviderError};
use crate::normalize::fold_width;
use crate::store::{Keyword, QuestionId};

/// Decides match/no-match for one candidate against a question's expected
/// keyword set.
pub struct SimilarityMatcher<P> {
    cache: Arc<EmbeddingCache<P>>,
    threshold: f32,
}

impl<P> std::fmt::Debug for SimilarityMatcher<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimilarityMatcher")
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}

impl<P: EmbeddingProvider> SimilarityMatcher<P> {
    pub fn new(cache: Arc<EmbeddingCache<P>>, threshold: f32) -> Self {
        Self { cache, threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn cache(&self) -> &EmbeddingCache<P> {
        &self.cache
    }

    /// Matches a candidate answer against the expected keywords of
    /// `question`.
    ///
    /// Exact (width/case-folded) equality short-circuits with score 1.0 and
    /// never touches the embedding path. Otherwise the candidate is compared
    /// to every expected keyword by cosine similarity; the best keyword wins
    /// if it reaches the threshold, with exact score ties broken toward the
    /// lower [`crate::store::KeywordId`]. An empty candidate or empty
    /// expected set is a no-match with no embedding work.
    ///
    /// Provider failures degrade per question, not per batch: if no
    /// surviving keyword reaches the threshold and at least one comparison
    /// failed, the verdict is `Undetermined` rather than `None`.
    pub async fn match_candidate(
        &self,
        question: QuestionId,
        candidate: &str,
        expected: &[Keyword],
    ) -> MatchVerdict {
        let folded = fold_width(candidate);
        let folded = folded.trim();
        if folded.is_empty() || expected.is_empty() {
            return MatchVerdict::no_match(question, 0.0);
        }

        // Exact short-circuit: keyword text is stored folded.
        if let Some(keyword) = expected.iter().find(|k| k.text == folded) {
            debug!(question = %question, keyword = %keyword.id, "exact match");
            return MatchVerdict::exact(
                question,
                MatchedKeyword {
                    id: keyword.id,
                    text: keyword.text.clone(),
                },
            );
        }

        let candidate_vec = match self.cache.get(folded).await {
            Ok(vec) => vec,
            Err(err) => return MatchVerdict::undetermined(question, err.to_string()),
        };

        let mut best: Option<(&Keyword, f32)> = None;
        let mut provider_failure: Option<ProviderError> = None;

        // Keyword sets arrive ordered by id, so keeping the first strict
        // maximum implements the lowest-id tie-break.
        for keyword in expected {
            let keyword_vec = match self.cache.get(&keyword.text).await {
                Ok(vec) => vec,
                Err(err) => {
                    provider_failure = Some(err);
                    continue;
                }
            };
            let score = cosine_similarity(&candidate_vec, &keyword_vec);
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((keyword, score));
            }
        }

        match (best, provider_failure) {
            (Some((keyword, score)), _) if score >= self.threshold => {
                debug!(question = %question, keyword = %keyword.id, score, "semantic match");
                MatchVerdict::semantic(
                    question,
                    MatchedKeyword {
                        id: keyword.id,
                        text: keyword.text.clone(),
                    },
                    score,
                )
            }
            // Partial failure below threshold: report undetermined, not
            // no-match, since the failed keyword might have matched.
            (_, Some(err)) => MatchVerdict::undetermined(question, err.to_string()),
            (Some((_, score)), None) => MatchVerdict::no_match(question, score),
            (None, None) => MatchVerdict::no_match(question, 0.0),
        }
    }
}

/// Cosine similarity of two f32 vectors, in [-1, 1]. Mismatched lengths and
/// zero-norm vectors score 0.0.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (dot, norm_a_sq, norm_b_sq) =
        a.iter()
            .zip(b.iter())
            .fold((0.0f32, 0.0f32, 0.0f32), |(dot, na, nb), (&av, &bv)| {
                (dot + av * bv, na + av * av, nb + bv * bv)
            });

    let norm_a = norm_a_sq.sqrt();
    let norm_b = norm_b_sq.sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
