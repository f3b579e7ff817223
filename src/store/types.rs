use serde::Serialize;

/// Stable identifier of a [`Question`] in the store arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct QuestionId(pub u64);

impl std::fmt::Display for QuestionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "q{}", self.0)
    }
}

/// Stable identifier of a [`Keyword`]. Ids are allocated monotonically, so
/// id order reflects insertion order and gives the matcher a deterministic
/// tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct KeywordId(pub u64);

impl std::fmt::Display for KeywordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "k{}", self.0)
    }
}

/// One section of a supplier report. Worksheets are identified by name and
/// own the ordering of their questions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Worksheet(String);

impl Worksheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Worksheet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Worksheet {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Worksheet {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// One verifiable quality-check item within a worksheet.
///
/// `prev`/`next` are arena links, not pointers: together with the
/// worksheet's head they form exactly one acyclic doubly-linked sequence.
#[derive(Debug, Clone, Serialize)]
pub struct Question {
    pub id: QuestionId,
    pub worksheet: Worksheet,
    pub text: String,
    /// Row this question maps to in the extracted report.
    pub row: u32,
    pub prev: Option<QuestionId>,
    pub next: Option<QuestionId>,
}

/// An expected correct-answer token/phrase for one question. `text` is
/// stored width/case-folded; (question, text) is unique.
#[derive(Debug, Clone, Serialize)]
pub struct Keyword {
    pub id: KeywordId,
    pub question: QuestionId,
    pub text: String,
}
