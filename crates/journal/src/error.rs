use thiserror::Error;

/// Errors raised by the journal store.
///
/// Mirrors the `-errno` return convention of `sd_journal_*`: operations
/// that can run out of entries or fail a cursor test return a dedicated
/// outcome type instead of an error (see [`crate::StepOutcome`] and
/// [`crate::WaitOutcome`]); this enum covers everything else.
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("cursor not found")]
    CursorNotFound,

    #[error("no current position; seek first")]
    NoPosition,

    #[error("field name must not be empty")]
    InvalidFieldName,
}

pub type JournalResult<T> = Result<T, JournalError>;
