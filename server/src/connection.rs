//! Per-socket connection handler
//!
//! One task per accepted socket. The task owns both halves of the stream:
//! it reads newline-delimited packets from the peer and drains the
//! connection's outbound queue, racing the two with `select!`. Both the
//! line read and the queue receive are cancel safe, so whichever loses
//! simply resumes on the next iteration.

use crate::matchmaking;
use crate::registry::{ConnectionId, Outbound, SharedRegistry};
use log::{debug, info, warn};
use shared::{Packet, MAX_LINE_LEN};
use std::io;
use std::net::SocketAddr;
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tokio::sync::mpsc;

pub const INVALID_PACKET: &str = "Invalid packet";

/// Drives one connection until the peer hangs up, a read or write fails,
/// a line grows past [`MAX_LINE_LEN`], or the server asks for the socket
/// to be closed.
pub async fn handle_connection<S>(stream: S, addr: SocketAddr, registry: SharedRegistry)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (tx, mut rx) = mpsc::unbounded_channel();
    let id = registry.lock().await.add_connection(addr, tx);

    let (reader, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();

    loop {
        // `line` is always shorter than MAX_LINE_LEN here
        let limit = MAX_LINE_LEN.saturating_sub(line.len()) as u64;

        tokio::select! {
            read = async { (&mut reader).take(limit).read_until(b'\n', &mut line).await } => match read {
                Ok(0) => {
                    info!("Connection {} closed by peer", id);
                    break;
                }
                Ok(_) if line.len() >= MAX_LINE_LEN && !line.ends_with(b"\n") => {
                    warn!("Connection {} sent a line longer than {} bytes", id, MAX_LINE_LEN);
                    if let Err(e) = write_packet(&mut writer, &line_too_long()).await {
                        debug!("Write to connection {} failed: {}", id, e);
                    }
                    break;
                }
                Ok(_) => {
                    let reply = process_line(&registry, id, &line).await;
                    line.clear();
                    if let Some(reply) = reply {
                        if let Err(e) = write_packet(&mut writer, &reply).await {
                            warn!("Write to connection {} failed: {}", id, e);
                            break;
                        }
                    }
                }
                Err(e) => {
                    info!("Connection {} lost: {}", id, e);
                    break;
                }
            },
            message = rx.recv() => match message {
                Some(Outbound::Packet(packet)) => {
                    if let Err(e) = write_packet(&mut writer, &packet).await {
                        warn!("Write to connection {} failed: {}", id, e);
                        break;
                    }
                }
                Some(Outbound::Close) | None => {
                    debug!("Server closing connection {}", id);
                    break;
                }
            },
        }
    }

    matchmaking::handle_disconnect(&mut *registry.lock().await, id);

    // A peer that already tore down its TLS session makes this fail
    if let Err(e) = writer.shutdown().await {
        debug!("Shutdown of connection {} failed: {}", id, e);
    }
}

/// Decodes one line and feeds it to matchmaking.
///
/// Returns the Error packet to send back when the line cannot be decoded;
/// the connection stays open either way.
async fn process_line(registry: &SharedRegistry, id: ConnectionId, line: &[u8]) -> Option<Packet> {
    if line.iter().all(u8::is_ascii_whitespace) {
        return None;
    }

    match Packet::decode(line) {
        Ok(packet) => {
            debug!("Connection {} sent {}", id, packet.packet_type());
            let mut registry = registry.lock().await;
            matchmaking::handle_packet(&mut registry, id, packet, &mut rand::thread_rng());
            None
        }
        Err(e) => {
            warn!("Connection {} sent an undecodable packet: {}", id, e);
            Some(Packet::error(format!("{}: {}", INVALID_PACKET, e)))
        }
    }
}

fn line_too_long() -> Packet {
    Packet::error(format!(
        "{}: line exceeds {} bytes",
        INVALID_PACKET, MAX_LINE_LEN
    ))
}

pub async fn write_packet<W>(writer: &mut W, packet: &Packet) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let line = packet
        .encode()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writer.write_all(&line).await?;
    writer.flush().await
}
