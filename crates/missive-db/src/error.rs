use thiserror::Error;

/// Storage-layer errors. Constraint violations the API layer needs to
/// distinguish get their own variants; everything else stays a raw
/// sqlite error.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("username already taken")]
    DuplicateUsername,

    #[error("message references a nonexistent user")]
    UnknownRecipient,

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type DbResult<T> = Result<T, DbError>;
