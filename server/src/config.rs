use crate::error::ServerError;
use std::path::PathBuf;

/// Certificate chain and private key, both PEM encoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Plain TCP when None
    pub tls: Option<TlsPaths>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: shared::DEFAULT_PORT,
            tls: None,
        }
    }
}

impl ServerConfig {
    /// Builds a config from the command-line pieces, checking that TLS has
    /// both halves of its key pair.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        tls: bool,
        cert: Option<PathBuf>,
        key: Option<PathBuf>,
    ) -> Result<Self, ServerError> {
        let tls = match (tls, cert, key) {
            (false, _, _) => None,
            (true, Some(cert), Some(key)) => Some(TlsPaths { cert, key }),
            (true, _, _) => {
                return Err(ServerError::Config(
                    "--tls requires both --cert and --key".to_string(),
                ))
            }
        };

        Ok(Self {
            host: host.into(),
            port,
            tls,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
