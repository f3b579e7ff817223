//! Shinsa: adaptive keyword-match engine for supplier quality reports.
//!
//! Supplier-submitted multi-sheet quality reports carry free-text answers
//! per question. This crate verifies them against an evolving database of
//! expected keywords, using exact matching first and embedding cosine
//! similarity second, and emits a per-question pass/fail verdict.
//!
//! # Components
//!
//! - [`normalize`](crate::normalize) — strips structural noise (numbering,
//!   section references, dates, document codes) from extracted text.
//! - [`QuestionStore`] — ordered, mutable question sequences per worksheet
//!   with O(1) structural edits and per-question keyword sets.
//! - [`EmbeddingCache`] — memoizes keyword embeddings with single-flight
//!   miss resolution; [`EmbeddingProvider`] is the opaque external model.
//! - [`SimilarityMatcher`] — exact-then-semantic match decisions under a
//!   configured threshold.
//! - [`MatchEngine`] — walks a worksheet in store order and produces the
//!   verdict stream consumed by the export collaborator.
//!
//! # Test/Mock Support
//!
//! [`MockProvider`] is available behind the `mock` feature (and in unit
//! tests) for deterministic similarity scores and provider call counting.

pub mod config;
pub mod embedding;
pub mod engine;
pub mod matcher;
pub mod normalize;
pub mod store;

pub use config::{ConfigError, DEFAULT_SIMILARITY_THRESHOLD, MatchConfig};
pub use embedding::{EmbeddingCache, EmbeddingProvider, ProviderError, ProviderResult, RetryPolicy};
#[cfg(any(test, feature = "mock"))]
pub use embedding::MockProvider;
pub use engine::{AnswerMap, EngineError, EngineResult, MatchEngine, WorksheetReport};
pub use matcher::{MatchKind, MatchVerdict, MatchedKeyword, SimilarityMatcher, cosine_similarity};
pub use normalize::{fold_width, normalize};
pub use store::{
    Keyword, KeywordId, Question, QuestionId, QuestionStore, StoreError, StoreResult, Worksheet,
};
