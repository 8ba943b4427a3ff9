//! Error types for codux-client.

use thiserror::Error;

/// Result type alias for codux-client operations.
pub type Result<T> = std::result::Result<T, CoduxError>;

/// Errors that can occur when talking to the execution service.
#[derive(Debug, Error)]
pub enum CoduxError {
    /// The service reported that the resource does not exist (HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),

    /// The package is already installed (HTTP 409 on `/packages`).
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Any other failure: unexpected status, network error, or a body that
    /// could not be decoded.
    #[error("API request failed: {message}")]
    TransportFailure {
        /// HTTP status, when the service answered at all.
        status: Option<u16>,
        /// Message from the service's error body, or the transport's own
        /// description.
        message: String,
    },

    /// Invalid client configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The interactive session has already shut down.
    #[error("session closed")]
    SessionClosed,
}

impl CoduxError {
    /// Build a transport failure that never reached an HTTP status.
    pub(crate) fn transport(message: impl Into<String>) -> Self {
        Self::TransportFailure {
            status: None,
            message: message.into(),
        }
    }

    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound(_) => Some(404),
            Self::AlreadyExists(_) => Some(409),
            Self::TransportFailure { status, .. } => *status,
            Self::InvalidConfig(_) | Self::SessionClosed => None,
        }
    }
}

impl From<reqwest::Error> for CoduxError {
    fn from(err: reqwest::Error) -> Self {
        crate::classify::classify_network(&err)
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for CoduxError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;
        match err {
            WsError::ConnectionClosed | WsError::AlreadyClosed => Self::SessionClosed,
            WsError::Http(response) => Self::TransportFailure {
                status: Some(response.status().as_u16()),
                message: format!("websocket upgrade rejected: {}", response.status()),
            },
            other => Self::transport(format!("websocket error: {other}")),
        }
    }
}
