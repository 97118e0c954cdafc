//! Line-delimited JSON packets exchanged between client and server
//!
//! Every packet is one JSON object on its own line. The object carries a
//! `packet_type` field naming the variant; the remaining fields follow that
//! variant's schema. Decoding only checks structure, never game rules.

use crate::game::{Game, Player};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Name of the discriminant field
pub const TYPE_FIELD: &str = "packet_type";

/// Longest line either side accepts, newline included
pub const MAX_LINE_LEN: usize = 64 * 1024;

const PACKET_TYPES: [&str; 8] = [
    "ConnectRequest",
    "ConnectResponse",
    "Error",
    "FoundGame",
    "SyncGame",
    "Move",
    "GameOver",
    "ConnectionLost",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "packet_type")]
pub enum Packet {
    // Client -> server
    ConnectRequest {
        lobby_id: String,
        username: String,
    },
    Move {
        lobby_id: String,
        column: i64,
        player: Player,
    },

    // Server -> client
    ConnectResponse {
        player: Player,
        game: Game,
    },
    Error {
        message: String,
    },
    FoundGame,
    /// Also accepted from a client as a request for the current game
    SyncGame {
        game: Game,
    },
    /// `winner` is null when the board filled up without four in a row
    GameOver {
        game: Game,
        winner: Option<Player>,
    },
    ConnectionLost,
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("packet is missing the \"packet_type\" field")]
    MissingType,

    #[error("unknown packet type {0:?}")]
    UnknownType(String),

    #[error("malformed {packet_type} packet: {source}")]
    Malformed {
        packet_type: String,
        source: serde_json::Error,
    },
}

impl Packet {
    pub fn error(message: impl Into<String>) -> Self {
        Packet::Error {
            message: message.into(),
        }
    }

    pub fn packet_type(&self) -> &'static str {
        match self {
            Packet::ConnectRequest { .. } => "ConnectRequest",
            Packet::Move { .. } => "Move",
            Packet::ConnectResponse { .. } => "ConnectResponse",
            Packet::Error { .. } => "Error",
            Packet::FoundGame => "FoundGame",
            Packet::SyncGame { .. } => "SyncGame",
            Packet::GameOver { .. } => "GameOver",
            Packet::ConnectionLost => "ConnectionLost",
        }
    }

    /// Encodes the packet as a single newline-terminated line
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(line)
    }

    /// Decodes one line. Surrounding whitespace, including the trailing
    /// newline, is ignored.
    pub fn decode(line: &[u8]) -> Result<Packet, CodecError> {
        let value: Value = serde_json::from_slice(line)?;

        let packet_type = match value.get(TYPE_FIELD) {
            Some(Value::String(name)) => name.clone(),
            Some(other) => return Err(CodecError::UnknownType(other.to_string())),
            None => return Err(CodecError::MissingType),
        };
        if !PACKET_TYPES.contains(&packet_type.as_str()) {
            return Err(CodecError::UnknownType(packet_type));
        }

        serde_json::from_value(value).map_err(|source| CodecError::Malformed {
            packet_type,
            source,
        })
    }
}
