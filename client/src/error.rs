use shared::CodecError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad packet from server: {0}")]
    Codec(#[from] CodecError),

    #[error("failed to read {path}: {source}")]
    ReadPem {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("server sent a line longer than {0} bytes")]
    LineTooLong(usize),

    #[error("server closed the connection")]
    Closed,

    #[error("input closed")]
    InputClosed,
}

impl From<rustls::Error> for ClientError {
    fn from(err: rustls::Error) -> Self {
        ClientError::Tls(err.to_string())
    }
}
