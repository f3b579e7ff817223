//! Question store: ordered, mutable question sequences with keyword sets.
//!
//! Questions live in an arena (a map keyed by [`QuestionId`]) and are chained
//! into one doubly-linked sequence per worksheet through `prev`/`next` id
//! links plus a per-worksheet head. Structural edits (insert, delete, move)
//! relink a constant number of neighbors, so they are O(1) regardless of
//! worksheet size.
//!
//! All state sits behind one `RwLock`: mutations take the write lock, which
//! serializes structural edits, and reads see a consistent snapshot relative
//! to any completed mutation. [`QuestionStore`] is a cheap `Arc` handle and
//! can be cloned across tasks.

mod error;
mod types;


pub use error::{StoreError, StoreResult};
pub use types::{Keyword, KeywordId, Question, QuestionId, Worksheet};

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::normalize::fold_width;

#[derive(Debug, Default)]
struct ListState {
    head: Option<QuestionId>,
    count: usize,
}

#[derive(Debug, Default)]
struct StoreInner {
    questions: HashMap<QuestionId, Question>,
    keywords: HashMap<KeywordId, Keyword>,
    by_question: HashMap<QuestionId, BTreeSet<KeywordId>>,
    lists: HashMap<Worksheet, ListState>,
    next_question: u64,
    next_keyword: u64,
}

/// Shared handle to the question/keyword store.
#[derive(Clone, Default)]
pub struct QuestionStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl std::fmt::Debug for QuestionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("QuestionStore")
            .field("questions", &inner.questions.len())
            .field("keywords", &inner.keywords.len())
            .field("worksheets", &inner.lists.len())
            .finish()
    }
}

impl QuestionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a question after `after` (or at the worksheet head when
    /// `after` is `None`) and returns its id. O(1) relink.
    pub fn insert_question(
        &self,
        worksheet: &Worksheet,
        text: impl Into<String>,
        row: u32,
        after: Option<QuestionId>,
    ) -> StoreResult<QuestionId> {
        let mut inner = self.inner.write();

        if let Some(after_id) = after {
            inner.check_in_worksheet(after_id, worksheet)?;
        }

        let id = QuestionId(inner.next_question);
        inner.next_question += 1;

        inner.questions.insert(
            id,
            Question {
                id,
                worksheet: worksheet.clone(),
                text: text.into(),
                row,
                prev: None,
                next: None,
            },
        );
        inner.by_question.insert(id, BTreeSet::new());
        inner.link_after(worksheet, id, after);

        debug!(question = %id, worksheet = %worksheet, "question inserted");
        Ok(id)
    }

    /// Deletes a question, relinking its neighbors and cascading to all of
    /// its keywords.
    pub fn delete_question(&self, id: QuestionId) -> StoreResult<()> {
        let mut inner = self.inner.write();
        if !inner.questions.contains_key(&id) {
            return Err(StoreError::QuestionNotFound(id));
        }
        inner.remove_question(id);
        debug!(question = %id, "question deleted");
        Ok(())
    }

    /// Deletes a set of questions atomically: if any id is unknown, nothing
    /// is applied.
    pub fn delete_questions(&self, ids: &[QuestionId]) -> StoreResult<()> {
        let mut inner = self.inner.write();
        let unique: BTreeSet<QuestionId> = ids.iter().copied().collect();
        for &id in &unique {
            if !inner.questions.contains_key(&id) {
                return Err(StoreError::QuestionNotFound(id));
            }
        }
        for id in unique {
            inner.remove_question(id);
        }
        debug!(count = ids.len(), "questions deleted");
        Ok(())
    }

    /// Updates question text in place; linkage is untouched.
    pub fn update_question_text(&self, id: QuestionId, text: impl Into<String>) -> StoreResult<()> {
        let mut inner = self.inner.write();
        let question = inner
            .questions
            .get_mut(&id)
            .ok_or(StoreError::QuestionNotFound(id))?;
        question.text = text.into();
        Ok(())
    }

    /// Updates the row mapping of a question. The worksheet argument must
    /// match the question's current worksheet; moving a question between
    /// worksheets is not a mapping update (see [`Self::move_question`]).
    pub fn update_question_mapping(
        &self,
        id: QuestionId,
        worksheet: &Worksheet,
        row: u32,
    ) -> StoreResult<()> {
        let mut inner = self.inner.write();
        inner.check_in_worksheet(id, worksheet)?;
        if let Some(question) = inner.questions.get_mut(&id) {
            question.row = row;
        }
        Ok(())
    }

    /// Moves a question after `after` (or to the worksheet head when `after`
    /// is `None`), preserving its id and keywords. Moving a question after
    /// itself is a no-op.
    pub fn move_question(&self, id: QuestionId, after: Option<QuestionId>) -> StoreResult<()> {
        let mut inner = self.inner.write();
        let worksheet = inner
            .questions
            .get(&id)
            .ok_or(StoreError::QuestionNotFound(id))?
            .worksheet
            .clone();

        if after == Some(id) {
            return Ok(());
        }
        if let Some(after_id) = after {
            inner.check_in_worksheet(after_id, &worksheet)?;
        }

        inner.unlink(id);
        inner.link_after(&worksheet, id, after);
        debug!(question = %id, after = ?after, "question moved");
        Ok(())
    }

    /// Inserts an expected keyword for a question. The text is width/case
    /// folded before storage; (question, folded text) must be unique.
    pub fn insert_keyword(&self, question: QuestionId, text: &str) -> StoreResult<KeywordId> {
        let folded = fold_width(text).trim().to_string();
        if folded.is_empty() {
            return Err(StoreError::EmptyKeyword);
        }

        let mut inner = self.inner.write();
        let owned = inner
            .by_question
            .get(&question)
            .ok_or(StoreError::QuestionNotFound(question))?;

        let duplicate = owned
            .iter()
            .any(|kid| inner.keywords.get(kid).is_some_and(|k| k.text == folded));
        if duplicate {
            return Err(StoreError::DuplicateKeyword {
                question,
                text: folded,
            });
        }

        let id = KeywordId(inner.next_keyword);
        inner.next_keyword += 1;
        inner.keywords.insert(
            id,
            Keyword {
                id,
                question,
                text: folded,
            },
        );
        if let Some(set) = inner.by_question.get_mut(&question) {
            set.insert(id);
        }

        debug!(keyword = %id, question = %question, "keyword inserted");
        Ok(id)
    }

    pub fn delete_keyword(&self, id: KeywordId) -> StoreResult<()> {
        let mut inner = self.inner.write();
        if !inner.keywords.contains_key(&id) {
            return Err(StoreError::KeywordNotFound(id));
        }
        inner.remove_keyword(id);
        Ok(())
    }

    /// Deletes a set of keywords atomically: all or none.
    pub fn delete_keywords(&self, ids: &[KeywordId]) -> StoreResult<()> {
        let mut inner = self.inner.write();
        let unique: BTreeSet<KeywordId> = ids.iter().copied().collect();
        for &id in &unique {
            if !inner.keywords.contains_key(&id) {
                return Err(StoreError::KeywordNotFound(id));
            }
        }
        for id in unique {
            inner.remove_keyword(id);
        }
        Ok(())
    }

    /// Returns the keyword set of a question, ordered by [`KeywordId`].
    pub fn keywords(&self, question: QuestionId) -> StoreResult<Vec<Keyword>> {
        let inner = self.inner.read();
        let owned = inner
            .by_question
            .get(&question)
            .ok_or(StoreError::QuestionNotFound(question))?;
        Ok(owned
            .iter()
            .filter_map(|kid| inner.keywords.get(kid).cloned())
            .collect())
    }

    pub fn question(&self, id: QuestionId) -> StoreResult<Question> {
        let inner = self.inner.read();
        inner
            .questions
            .get(&id)
            .cloned()
            .ok_or(StoreError::QuestionNotFound(id))
    }

    /// Number of live questions in a worksheet.
    pub fn question_count(&self, worksheet: &Worksheet) -> usize {
        self.inner
            .read()
            .lists
            .get(worksheet)
            .map_or(0, |l| l.count)
    }

    /// Worksheets that have ever held a question.
    pub fn worksheets(&self) -> Vec<Worksheet> {
        self.inner.read().lists.keys().cloned().collect()
    }

    /// Traverses a worksheet head-to-tail and returns its questions in
    /// order.
    ///
    /// Revisiting a node (a cycle) or finishing with
    /// a count that disagrees with the stored live count surfaces
    /// [`StoreError::CorruptOrdering`] rather than silently returning a
    /// partial sequence.
    pub fn list_ordered(&self, worksheet: &Worksheet) -> StoreResult<Vec<Question>> {
        let inner = self.inner.read();
        let Some(list) = inner.lists.get(worksheet) else {
            return Ok(Vec::new());
        };

        let mut ordered = Vec::with_capacity(list.count);
        let mut visited = HashSet::with_capacity(list.count);
        let mut cursor = list.head;

        while let Some(id) = cursor {
            if !visited.insert(id) {
                return Err(StoreError::CorruptOrdering {
                    worksheet: worksheet.clone(),
                    reason: format!("cycle detected at {id}"),
                });
            }
            let question =
                inner
                    .questions
                    .get(&id)
                    .ok_or_else(|| StoreError::CorruptOrdering {
                        worksheet: worksheet.clone(),
                        reason: format!("dangling link to {id}"),
                    })?;
            ordered.push(question.clone());
            cursor = question.next;
        }

        if ordered.len() != list.count {
            return Err(StoreError::CorruptOrdering {
                worksheet: worksheet.clone(),
                reason: format!(
                    "traversed {} questions, expected {}",
                    ordered.len(),
                    list.count
                ),
            });
        }
        Ok(ordered)
    }
}

#[cfg(test)]
impl QuestionStore {
    /// Breaks the stored live count for a worksheet so traversal trips the
    /// corruption check. Simulates a prior mutation bug.
    pub(crate) fn force_list_count(&self, worksheet: &Worksheet, count: usize) {
        if let Some(list) = self.inner.write().lists.get_mut(worksheet) {
            list.count = count;
        }
    }
}

impl StoreInner {
    fn check_in_worksheet(&self, id: QuestionId, worksheet: &Worksheet) -> StoreResult<()> {
        let question = self
            .questions
            .get(&id)
            .ok_or(StoreError::QuestionNotFound(id))?;
        if &question.worksheet != worksheet {
            return Err(StoreError::WorksheetMismatch {
                question: id,
                actual: question.worksheet.clone(),
                requested: worksheet.clone(),
            });
        }
        Ok(())
    }

    /// Splices an unlinked question into a worksheet sequence. `after` must
    /// already be validated as a member of `worksheet`.
    fn link_after(&mut self, worksheet: &Worksheet, id: QuestionId, after: Option<QuestionId>) {
        let (prev, next) = match after {
            None => {
                let list = self.lists.entry(worksheet.clone()).or_default();
                let old_head = list.head;
                list.head = Some(id);
                (None, old_head)
            }
            Some(after_id) => {
                let next = self.questions.get(&after_id).and_then(|q| q.next);
                (Some(after_id), next)
            }
        };

        if let Some(prev_id) = prev {
            if let Some(prev_q) = self.questions.get_mut(&prev_id) {
                prev_q.next = Some(id);
            }
        }
        if let Some(next_id) = next {
            if let Some(next_q) = self.questions.get_mut(&next_id) {
                next_q.prev = Some(id);
            }
        }
        if let Some(q) = self.questions.get_mut(&id) {
            q.prev = prev;
            q.next = next;
        }

        self.lists.entry(worksheet.clone()).or_default().count += 1;
    }

    /// Removes a question from its worksheet sequence, relinking neighbors.
    fn unlink(&mut self, id: QuestionId) {
        let Some(question) = self.questions.get(&id) else {
            return;
        };
        let (worksheet, prev, next) = (question.worksheet.clone(), question.prev, question.next);

        if let Some(prev_id) = prev {
            if let Some(prev_q) = self.questions.get_mut(&prev_id) {
                prev_q.next = next;
            }
        }
        if let Some(next_id) = next {
            if let Some(next_q) = self.questions.get_mut(&next_id) {
                next_q.prev = prev;
            }
        }
        if let Some(list) = self.lists.get_mut(&worksheet) {
            if list.head == Some(id) {
                list.head = next;
            }
            list.count -= 1;
        }
        if let Some(q) = self.questions.get_mut(&id) {
            q.prev = None;
            q.next = None;
        }
    }

    fn remove_question(&mut self, id: QuestionId) {
        self.unlink(id);
        self.questions.remove(&id);
        if let Some(owned) = self.by_question.remove(&id) {
            for kid in owned {
                self.keywords.remove(&kid);
            }
        }
    }

    fn remove_keyword(&mut self, id: KeywordId) {
        if let Some(keyword) = self.keywords.remove(&id) {
            if let Some(set) = self.by_question.get_mut(&keyword.question) {
                set.remove(&id);
            }
        }
    }
}
