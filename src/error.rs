use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("scenario store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("scenario not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
}

pub type Result<T> = std::result::Result<T, Error>;
