//! Error types for the aggregation service

use thiserror::Error;

/// Failure talking to the evaluation service
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("unauthorized (401)")]
    Unauthorized,

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl UpstreamError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, UpstreamError::Unauthorized)
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            UpstreamError::Timeout
        } else if e.is_decode() {
            UpstreamError::Malformed(e.to_string())
        } else {
            UpstreamError::Network(e)
        }
    }
}

#[derive(Error, Debug)]
pub enum AggError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication error: {0}")]
    Auth(#[source] UpstreamError),

    #[error("Failed to fetch prices for {ticker}: {source}")]
    Fetch {
        ticker: String,
        #[source]
        source: UpstreamError,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AggError {
    pub fn fetch(ticker: &str, source: UpstreamError) -> Self {
        AggError::Fetch {
            ticker: ticker.to_string(),
            source,
        }
    }

    /// Whether the failure came from the evaluation service rather than the request
    pub fn is_upstream(&self) -> bool {
        matches!(self, AggError::Auth(_) | AggError::Fetch { .. })
    }
}

pub type Result<T> = std::result::Result<T, AggError>;
