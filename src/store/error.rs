use thiserror::Error;

use super::types::{KeywordId, QuestionId, Worksheet};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("question not found: {0}")]
    QuestionNotFound(QuestionId),

    #[error("keyword not found: {0}")]
    KeywordNotFound(KeywordId),

    #[error("duplicate keyword {text:?} for question {question}")]
    DuplicateKeyword { question: QuestionId, text: String },

    #[error("keyword is empty after normalization")]
    EmptyKeyword,

    #[error("question {question} belongs to worksheet {actual}, not {requested}")]
    WorksheetMismatch {
        question: QuestionId,
        actual: Worksheet,
        requested: Worksheet,
    },

    /// Defensive invariant check: traversal revisited a node or the visit
    /// count disagreed with the stored count. Indicates a prior mutation
    /// bug, not user error; the worksheet is unverifiable until repaired.
    #[error("corrupt ordering in worksheet {worksheet}: {reason}")]
    CorruptOrdering { worksheet: Worksheet, reason: String },
}

pub type StoreResult<T> = Result<T, StoreError>;
