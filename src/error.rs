use thiserror::Error;

use crate::models::MAX_COMPETITORS;

/// Problems with user input, reported before any network call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("URL must not be empty")]
    EmptyUrl,

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid URL scheme '{0}': only http and https are supported")]
    UnsupportedScheme(String),

    #[error("Too many competitor URLs ({0}): at most {MAX_COMPETITORS} are supported")]
    TooManyCompetitors(usize),
}

/// Failures talking to one of the hosted services or to a crawled site.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No API key configured for the named service
    #[error("no API key configured for {0}")]
    MissingApiKey(&'static str),

    #[error("request timed out")]
    Timeout,

    /// Connection refused, DNS failure and other transport problems
    #[error("network error: {0}")]
    Network(String),

    /// Non-2xx response from the service itself
    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    /// The crawled site answered with an error status
    #[error("target responded with HTTP {0}")]
    TargetStatus(u16),

    /// Response body did not have the expected shape
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_decode() {
            ClientError::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            ClientError::TargetStatus(status.as_u16())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}
