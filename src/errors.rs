use thiserror::Error;

/// Error type covering every failure the ledger engine can surface.
#[derive(Debug, Error)]
pub enum BankError {
    #[error("account `{0}` already exists")]
    AccountAlreadyExists(String),
    #[error("account `{0}` does not exist")]
    AccountNotFound(String),
    #[error("an equal transaction already exists on account `{0}`")]
    TransactionAlreadyExists(String),
    #[error("transaction does not exist on account `{0}`")]
    TransactionNotFound(String),
    #[error("invalid transaction attribute: {0}")]
    Attribute(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed transaction record: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, BankError>;

impl From<serde_json::Error> for BankError {
    fn from(err: serde_json::Error) -> Self {
        BankError::Parse(err.to_string())
    }
}
