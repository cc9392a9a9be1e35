use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A previous holder of the connection lock panicked.
    #[error("store connection lock poisoned")]
    Poisoned,
}
