use thiserror::Error;

/// Top-level error type for driftline operations.
#[derive(Error, Debug)]
pub enum DriftlineError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database lock poisoned")]
    LockPoisoned,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parsing error: {0}")]
    FeedParse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Feed not found: {0}")]
    FeedNotFound(String),

    #[error("Article not found: {0}")]
    ArticleNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("AI provider '{0}' is not available")]
    AiUnavailable(String),

    #[error("AI API error: {0}")]
    AiApi(String),

    #[error("AI generation returned no output")]
    AiGeneration,

    #[error("No articles in the requested window")]
    NoArticles,
}

pub type Result<T> = std::result::Result<T, DriftlineError>;
