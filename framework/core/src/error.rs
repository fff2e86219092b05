/// A request could not be completed at the transport level.
///
/// HTTP error statuses are never reported with this type. They are ordinary responses that the
/// scenario inspects. This error means no response was received at all, which is fatal to the
/// scenario that issued the request but not to the run.
#[derive(derive_more::Error, derive_more::Display, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[display("Request to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },
    #[display("Failed to connect to {url}: {message}")]
    Connect { url: String, message: String },
    #[display("Invalid request URL {url}: {message}")]
    InvalidUrl { url: String, message: String },
    #[display("Request to {url} failed: {message}")]
    Other { url: String, message: String },
}

impl TransportError {
    /// The URL of the request that failed.
    pub fn url(&self) -> &str {
        match self {
            TransportError::Timeout { url, .. }
            | TransportError::Connect { url, .. }
            | TransportError::InvalidUrl { url, .. }
            | TransportError::Other { url, .. } => url,
        }
    }
}

/// The run cannot start because the supplied configuration is unusable.
///
/// This is the only error that is allowed to terminate the run process, and it is always raised
/// before any scenario executes.
#[derive(derive_more::Error, derive_more::Display, Debug, Clone, PartialEq, Eq)]
#[display("Invalid configuration: {msg}")]
pub struct ConfigurationError {
    msg: String,
}

impl ConfigurationError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

/// A response body could not be parsed into the structure a check asked for.
#[derive(derive_more::Error, derive_more::Display, Debug, Clone, PartialEq, Eq)]
#[display("Failed to parse response body: {msg}")]
pub struct ParseError {
    msg: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}
