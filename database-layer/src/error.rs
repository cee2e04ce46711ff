use thiserror::Error;
use tracking_engine::StoreError;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),
}

impl From<DatabaseError> for StoreError {
    fn from(error: DatabaseError) -> Self {
        StoreError::Backend(error.to_string())
    }
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;
