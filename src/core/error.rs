//! Error types for rate lookups and rebasing

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FxError {
    #[error("Remote API error: HTTP {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    #[error("Invalid rate {rate} for currency: {currency}")]
    InvalidRate { currency: String, rate: f64 },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl FxError {
    /// Maps a transport failure, keeping timeouts distinct from other network errors.
    pub(crate) fn from_transport(err: reqwest::Error, endpoint: &str) -> Self {
        if err.is_timeout() {
            FxError::Timeout(endpoint.to_string())
        } else {
            // The request URL carries the app id, keep it out of messages.
            FxError::Network(format!("{} for endpoint: {endpoint}", err.without_url()))
        }
    }
}

pub type Result<T> = std::result::Result<T, FxError>;
