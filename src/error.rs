use serde::{Deserialize, Serialize};

/// Boxed error produced by a [`Transport`](crate::Transport) implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum PsdbError {
    /// Failure raised by the transport itself (network, DNS, timeout, ...).
    ///
    /// The original error is kept as the source so callers can downcast it,
    /// e.g. to `reqwest::Error`.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),
    /// Non-success HTTP status returned by the service.
    #[error(transparent)]
    Database(#[from] DatabaseError),
    /// Malformed wire data: response JSON, base64 row blobs, column lengths
    /// or a cell that cannot be cast to its declared type.
    #[error("decode error: {0}")]
    Decode(String),
    /// Query text and arguments could not be combined.
    #[error("format error: {0}")]
    Format(String),
    /// Invalid connection configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl PsdbError {
    /// Returns the structured service error for non-2xx responses.
    pub fn as_database_error(&self) -> Option<&DatabaseError> {
        match self {
            Self::Database(err) => Some(err),
            _ => None,
        }
    }
}

/// `{code, message}` error body reported by the service.
///
/// Either key may be omitted on the wire and then reads as empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VitessError {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: String,
}

/// Structured error for a non-2xx HTTP response.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("database error {status}: {message}")]
pub struct DatabaseError {
    /// Human readable message.
    pub message: String,
    /// HTTP status code of the response.
    pub status: u16,
    /// Error body as reported by the service.
    pub body: VitessError,
}

impl DatabaseError {
    pub fn new(message: impl Into<String>, status: u16, body: VitessError) -> Self {
        Self {
            message: message.into(),
            status,
            body,
        }
    }

    /// Service error code, e.g. `"internal"` or `"unauthenticated"`.
    pub fn code(&self) -> &str {
        &self.body.code
    }
}
