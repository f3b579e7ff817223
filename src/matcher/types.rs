use serde::Serialize;

use crate::store::{KeywordId, QuestionId};

/// How a verdict was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Candidate equals an expected keyword after width/case folding.
    Exact,
    /// Best cosine similarity reached the configured threshold.
    Semantic,
    /// No expected keyword reached the threshold (or there was nothing to
    /// compare).
    None,
    /// The embedding provider was unavailable for this question; distinct
    /// from a no-match so reviewers can tell "checked and failed" from
    /// "could not check".
    Undetermined,
}

impl MatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchKind::Exact => "EXACT",
            MatchKind::Semantic => "SEMANTIC",
            MatchKind::None => "NONE",
            MatchKind::Undetermined => "UNDETERMINED",
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, MatchKind::Exact | MatchKind::Semantic)
    }
}

impl std::fmt::Display for MatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The expected keyword a candidate matched against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedKeyword {
    pub id: KeywordId,
    pub text: String,
}

/// Per-question outcome of matching, consumed by the external export
/// collaborator (e.g. rendered as cell coloring).
#[derive(Debug, Clone, Serialize)]
pub struct MatchVerdict {
    pub question: QuestionId,
    pub matched: bool,
    pub keyword: Option<MatchedKeyword>,
    /// Best similarity observed; 1.0 for exact matches, kept on no-match
    /// verdicts for diagnostics and ranking.
    pub score: f32,
    pub kind: MatchKind,
    /// Provider error text for [`MatchKind::Undetermined`] verdicts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MatchVerdict {
    pub fn exact(question: QuestionId, keyword: MatchedKeyword) -> Self {
        Self {
            question,
            matched: true,
            keyword: Some(keyword),
            score: 1.0,
            kind: MatchKind::Exact,
            error: None,
        }
    }

    pub fn semantic(question: QuestionId, keyword: MatchedKeyword, score: f32) -> Self {
        Self {
            question,
            matched: true,
            keyword: Some(keyword),
            score,
            kind: MatchKind::Semantic,
            error: None,
        }
    }

    pub fn no_match(question: QuestionId, best_score: f32) -> Self {
        Self {
            question,
            matched: false,
            keyword: None,
            score: best_score,
            kind: MatchKind::None,
            error: None,
        }
    }

    pub fn undetermined(question: QuestionId, error: impl Into<String>) -> Self {
        Self {
            question,
            matched: false,
            keyword: None,
            score: 0.0,
            kind: MatchKind::Undetermined,
            error: Some(error.into()),
        }
    }
}
