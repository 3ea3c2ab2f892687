use thiserror::Error;

/// Every way a single resolution can fail. All variants are terminal for the
/// resolution that produced them.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Something expected was absent from an otherwise successful fetch.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("challenge unsolvable: {0}")]
    ChallengeUnsolvable(String),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("no content identifier found for {0}")]
    NoIdentifierFound(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("no suitable extractor found for URL: {0}")]
    Unsupported(String),
}

impl From<reqwest::Error> for ResolveError {
    fn from(err: reqwest::Error) -> Self {
        ResolveError::Transport(err.to_string())
    }
}

impl From<rquickjs::Error> for ResolveError {
    fn from(err: rquickjs::Error) -> Self {
        ResolveError::ChallengeUnsolvable(err.to_string())
    }
}

impl From<url::ParseError> for ResolveError {
    fn from(err: url::ParseError) -> Self {
        ResolveError::InvalidUrl(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ResolveError>;
