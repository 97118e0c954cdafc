use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop the server from starting or accepting connections.
///
/// Problems on a single connection never surface here; the connection
/// handler deals with them and drops only that socket.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to read {path}: {source}")]
    ReadPem {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<rustls::Error> for ServerError {
    fn from(err: rustls::Error) -> Self {
        ServerError::Tls(err.to_string())
    }
}
