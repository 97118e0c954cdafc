//! Loads the server's certificate chain and private key into a TLS acceptor

use crate::config::TlsPaths;
use crate::error::ServerError;
use log::info;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tokio_rustls::TlsAcceptor;

pub fn load_acceptor(paths: &TlsPaths) -> Result<TlsAcceptor, ServerError> {
    let certs = parse_certs(&read_pem(&paths.cert)?)?;
    let key = parse_private_key(&read_pem(&paths.key)?)?;

    let config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)?;

    info!(
        "TLS enabled: cert='{}' key='{}'",
        paths.cert.display(),
        paths.key.display()
    );
    Ok(TlsAcceptor::from(Arc::new(config)))
}

fn read_pem(path: &Path) -> Result<Vec<u8>, ServerError> {
    fs::read(path).map_err(|source| ServerError::ReadPem {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse_certs(pem: &[u8]) -> Result<Vec<CertificateDer<'static>>, ServerError> {
    let mut reader = pem;
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ServerError::Tls(format!("parse certs: {e}")))?;

    if certs.is_empty() {
        return Err(ServerError::Tls("certificate chain empty".to_string()));
    }
    Ok(certs)
}

/// Accepts PKCS#8, PKCS#1 and SEC1 keys; the first key in the file wins
pub fn parse_private_key(pem: &[u8]) -> Result<PrivateKeyDer<'static>, ServerError> {
    let mut reader = pem;
    rustls_pemfile::private_key(&mut reader)
        .map_err(|e| ServerError::Tls(format!("parse key: {e}")))?
        .ok_or_else(|| ServerError::Tls("no private key found".to_string()))
}
