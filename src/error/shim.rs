use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ShimError {
    /// A data operation ran before `connect()` or after `disconnect()`.
    #[error("Store is not connected; call connect() first")]
    NotConnected,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Unknown column `{column}` on table `{table}`")]
    UnknownColumn { table: &'static str, column: String },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Ractor error: {0}")]
    RactorError(String),
}

impl ShimError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        ShimError::InvalidQuery(msg.into())
    }

    /// True when the underlying store rejected the statement on a UNIQUE/PK constraint.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            ShimError::Database(sqlx::Error::Database(db)) => db.is_unique_violation(),
            _ => false,
        }
    }
}
