//! Client side of the line protocol: TCP or TLS stream, one JSON packet per line

use crate::error::ClientError;
use log::{debug, info};
use rustls::pki_types::ServerName;
use rustls::RootCertStore;
use shared::{Packet, MAX_LINE_LEN};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, ReadHalf,
    WriteHalf,
};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

/// Anything a [`Connection`] can run over
pub trait PacketStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> PacketStream for T {}

pub type BoxedStream = Box<dyn PacketStream>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    /// Certificate to trust; TLS is used when set
    pub tls_cert: Option<PathBuf>,
}

impl ClientConfig {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        tls: bool,
        cert: Option<PathBuf>,
    ) -> Result<Self, ClientError> {
        let tls_cert = match (tls, cert) {
            (false, _) => None,
            (true, Some(cert)) => Some(cert),
            (true, None) => {
                return Err(ClientError::Config("--tls requires --cert".to_string()));
            }
        };

        Ok(Self {
            host: host.into(),
            port,
            tls_cert,
        })
    }
}

/// Opens the socket described by `config`, performing the TLS handshake if asked
pub async fn connect(config: &ClientConfig) -> Result<Connection<BoxedStream>, ClientError> {
    let stream = TcpStream::connect((config.host.as_str(), config.port)).await?;
    stream.set_nodelay(true)?;
    info!("Connected to {}:{}", config.host, config.port);

    let stream: BoxedStream = match &config.tls_cert {
        None => Box::new(stream),
        Some(cert) => {
            let connector = tls_connector(cert)?;
            let name = ServerName::try_from(config.host.clone()).map_err(|e| {
                ClientError::Tls(format!("invalid server name {:?}: {e}", config.host))
            })?;
            let stream = connector.connect(name, stream).await?;
            info!("TLS session established");
            Box::new(stream)
        }
    };

    Ok(Connection::new(stream))
}

fn tls_connector(cert: &Path) -> Result<TlsConnector, ClientError> {
    let pem = std::fs::read(cert).map_err(|source| ClientError::ReadPem {
        path: cert.to_path_buf(),
        source,
    })?;

    let mut roots = RootCertStore::empty();
    let mut reader = pem.as_slice();
    for cert in rustls_pemfile::certs(&mut reader) {
        let cert = cert.map_err(|e| ClientError::Tls(format!("parse certs: {e}")))?;
        roots.add(cert)?;
    }
    if roots.is_empty() {
        return Err(ClientError::Tls(format!(
            "no certificates in {}",
            cert.display()
        )));
    }

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(TlsConnector::from(Arc::new(config)))
}

/// A framed connection to the server.
///
/// [`Connection::recv`] keeps any partially read line in the connection, so
/// it can be raced in `select!` without losing data.
pub struct Connection<S> {
    reader: BufReader<ReadHalf<S>>,
    writer: WriteHalf<S>,
    buffer: Vec<u8>,
}

impl<S: AsyncRead + AsyncWrite> Connection<S> {
    pub fn new(stream: S) -> Self {
        let (reader, writer) = tokio::io::split(stream);
        Self {
            reader: BufReader::new(reader),
            writer,
            buffer: Vec::new(),
        }
    }

    pub async fn send(&mut self, packet: &Packet) -> Result<(), ClientError> {
        debug!("Sending {}", packet.packet_type());
        self.writer.write_all(&packet.encode()?).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Next packet from the server, or None once it closed the connection.
    ///
    /// A line longer than [`MAX_LINE_LEN`] is an error; the connection
    /// should be dropped after it.
    pub async fn recv(&mut self) -> Result<Option<Packet>, ClientError> {
        loop {
            let limit = MAX_LINE_LEN.saturating_sub(self.buffer.len()) as u64;
            let read = (&mut self.reader)
                .take(limit)
                .read_until(b'\n', &mut self.buffer)
                .await?;
            if read == 0 && self.buffer.is_empty() {
                return Ok(None);
            }
            if self.buffer.len() >= MAX_LINE_LEN && !self.buffer.ends_with(b"\n") {
                self.buffer.clear();
                return Err(ClientError::LineTooLong(MAX_LINE_LEN));
            }
            // Either a full line or the unterminated tail before EOF
            let line = std::mem::take(&mut self.buffer);
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            let packet = Packet::decode(&line)?;
            debug!("Received {}", packet.packet_type());
            return Ok(Some(packet));
        }
    }

    pub async fn shutdown(&mut self) -> Result<(), ClientError> {
        self.writer.shutdown().await?;
        Ok(())
    }
}
