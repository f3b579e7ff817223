use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// Store-level failure; `CorruptOrdering` here means the worksheet is
    /// fully unverifiable.
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type EngineResult<T> = Result<T, EngineError>;
