use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("{0}")]
    Validation(String),
    #[error("request failed: {0}")]
    Http(String),
    #[error("{0}")]
    Backend(String),
    #[error("credential store error: {0}")]
    Credential(String),
    #[error("not logged in; run `taskpilot login` first")]
    AuthenticationRequired,
}
