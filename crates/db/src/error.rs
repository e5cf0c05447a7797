use tiketon_core::error::CoreError;

/// Failure of a ledger or issuance operation: either a domain rule was
/// violated or the database call itself failed.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
