/// Shared error type used across all brain crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("provider {provider}: {message}")]
    Provider { provider: String, message: String },

    /// The session store could not be reached (connection refused, dropped,
    /// timed out).  Safe to retry for idempotent operations.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// The session store was reachable but rejected the command.
    #[error("store: {0}")]
    Store(String),

    #[error("config: {0}")]
    Config(String),

    #[error("auth: {0}")]
    Auth(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether a retry has a reasonable chance of succeeding.
    ///
    /// Connectivity and timeout failures are transient.  Provider errors are
    /// transient only when they carry a rate-limit or server-side HTTP status.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::StoreUnavailable(_) | Error::Timeout(_) | Error::Http(_) => true,
            Error::Provider { message, .. } => {
                message.starts_with("HTTP 429") || message.starts_with("HTTP 5")
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
