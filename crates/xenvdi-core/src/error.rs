//! Error types for the xenvdi core library.

use std::path::PathBuf;

/// The main error type for VDI transfer operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error with optional path context.
    #[error("I/O error{}: {source}", path.as_ref().map(|p| format!(" at '{}'", p.display())).unwrap_or_default())]
    Io {
        source: std::io::Error,
        path: Option<PathBuf>,
    },

    /// The server rejected the login.
    #[error("Authentication failed: {}", description.join(", "))]
    Authentication { description: Vec<String> },

    /// A remote call returned a non-success status.
    #[error("{method} failed: {}", description.join(", "))]
    Rpc {
        method: String,
        description: Vec<String>,
    },

    /// Malformed XML-RPC data or an unexpected value shape.
    #[error("XML-RPC error: {message}")]
    XmlRpc { message: String },

    /// The HTTP round-trip to the management endpoint failed.
    #[error("HTTP error: {source}")]
    Http { source: reqwest::Error },

    /// Querying the source image's metadata failed.
    #[error("Probe error: {message}")]
    Probe { message: String },

    /// The conversion tool failed to move the data.
    #[error("Transfer error: {message}")]
    Transfer { message: String },
}

/// A specialized Result type for xenvdi operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an I/O error with path context.
    pub fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io {
            source,
            path: Some(path.into()),
        }
    }

    /// Create an I/O error without path context.
    pub fn io_simple(source: std::io::Error) -> Self {
        Self::Io { source, path: None }
    }

    /// Create an authentication error from the server's description.
    pub fn authentication(description: Vec<String>) -> Self {
        Self::Authentication { description }
    }

    /// Create an RPC error for `method` from the server's description.
    pub fn rpc(method: impl Into<String>, description: Vec<String>) -> Self {
        Self::Rpc {
            method: method.into(),
            description,
        }
    }

    /// Create an XML-RPC error.
    pub fn xml_rpc(message: impl Into<String>) -> Self {
        Self::XmlRpc {
            message: message.into(),
        }
    }

    /// Create a probe error.
    pub fn probe(message: impl Into<String>) -> Self {
        Self::Probe {
            message: message.into(),
        }
    }

    /// Create a transfer error.
    pub fn transfer(message: impl Into<String>) -> Self {
        Self::Transfer {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::io_simple(source)
    }
}

impl From<reqwest::Error> for Error {
    fn from(source: reqwest::Error) -> Self {
        Self::Http { source }
    }
}
