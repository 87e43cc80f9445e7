use thiserror::Error;

#[derive(Error, Debug)]
pub enum PagefeedError {
    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Script error: {0}")]
    Script(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Video resolution failed: {0}")]
    VideoResolve(String),
}

pub type Result<T> = std::result::Result<T, PagefeedError>;
