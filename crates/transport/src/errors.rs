//! Transport failures: the request never produced a usable response.

use gitprovider::ProviderError;
use thiserror::Error;

pub type TransportResult<T> = std::result::Result<T, TransportError>;

#[derive(Debug, Error)]
pub enum TransportError {
    /// The configured base URL could not be parsed or cannot carry a path.
    #[error("invalid base url '{url}'")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: Option<url::ParseError>,
    },

    /// Connection, TLS or protocol failure reported by `reqwest`.
    #[error("http request failed")]
    Request {
        #[from]
        source: reqwest::Error,
    },

    /// The body of a response could not be decoded as the expected type.
    #[error("could not decode response body (status {status})")]
    Decode {
        status: u16,
        #[source]
        source: serde_json::Error,
    },
}

impl From<TransportError> for ProviderError {
    fn from(error: TransportError) -> Self {
        ProviderError::Transport {
            message: error.to_string(),
            source: Some(Box::new(error)),
        }
    }
}
