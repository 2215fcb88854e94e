use certdb_db::error::DatabaseError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("failed to bind {addr}: {reason}")]
    Bind { addr: String, reason: String },

    #[error("request loop failed: {0}")]
    Recv(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
