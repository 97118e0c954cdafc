//! Session registry: which games exist and which connection plays where
//!
//! The registry owns two mappings:
//! - lobby id -> [`Game`], the authoritative record of every open lobby
//! - connection id -> [`Connection`], the outbound queue of every accepted
//!   socket plus the lobby and player it registered as
//!
//! Players never hold a handle to their socket. A packet for a player is
//! addressed by looking up the connection seated as that player, so a
//! closed socket simply stops being found.
//!
//! The whole registry sits behind one async mutex (see [`SharedRegistry`]).
//! Matchmaking mutates games and queues the resulting packets while holding
//! it, which keeps every state change and its broadcast a single step.

use log::{debug, info};
use shared::{Game, Packet, PlayerId};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

pub type ConnectionId = u64;

pub type SharedRegistry = Arc<Mutex<SessionRegistry>>;

/// Instructions for a connection's socket, drained by its handler task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Packet(Packet),
    Close,
}

/// An accepted socket as seen by the registry
#[derive(Debug)]
pub struct Connection {
    pub id: ConnectionId,
    pub addr: SocketAddr,
    /// Lobby this connection registered into, if any
    pub lobby_id: Option<String>,
    /// Player identity assigned on registration
    pub player_id: Option<PlayerId>,
    sender: mpsc::UnboundedSender<Outbound>,
}

impl Connection {
    fn push(&self, message: Outbound) -> bool {
        self.sender.send(message).is_ok()
    }
}

#[derive(Debug)]
pub struct SessionRegistry {
    games: HashMap<String, Game>,
    connections: HashMap<ConnectionId, Connection>,
    next_connection_id: ConnectionId,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            games: HashMap::new(),
            connections: HashMap::new(),
            next_connection_id: 1,
        }
    }

    pub fn shared() -> SharedRegistry {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Registers a freshly accepted socket and returns its id
    pub fn add_connection(
        &mut self,
        addr: SocketAddr,
        sender: mpsc::UnboundedSender<Outbound>,
    ) -> ConnectionId {
        let id = self.next_connection_id;
        self.next_connection_id += 1;

        self.connections.insert(
            id,
            Connection {
                id,
                addr,
                lobby_id: None,
                player_id: None,
                sender,
            },
        );
        info!("Connection {} accepted from {}", id, addr);
        id
    }

    pub fn remove_connection(&mut self, id: ConnectionId) -> Option<Connection> {
        let removed = self.connections.remove(&id);
        if let Some(conn) = &removed {
            info!("Connection {} from {} removed", id, conn.addr);
        }
        removed
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    pub fn lobby_of(&self, id: ConnectionId) -> Option<&str> {
        self.connections.get(&id)?.lobby_id.as_deref()
    }

    /// Records that `id` plays as `player_id` in `lobby_id`
    pub fn seat(&mut self, id: ConnectionId, lobby_id: &str, player_id: PlayerId) -> bool {
        match self.connections.get_mut(&id) {
            Some(conn) => {
                conn.lobby_id = Some(lobby_id.to_string());
                conn.player_id = Some(player_id);
                true
            }
            None => false,
        }
    }

    /// Forgets the lobby and player of every connection seated in `lobby_id`
    pub fn unseat_all(&mut self, lobby_id: &str) -> Vec<ConnectionId> {
        let mut unseated = Vec::new();
        for conn in self.connections.values_mut() {
            if conn.lobby_id.as_deref() == Some(lobby_id) {
                conn.lobby_id = None;
                conn.player_id = None;
                unseated.push(conn.id);
            }
        }
        unseated.sort_unstable();
        unseated
    }

    pub fn find_connection_by_player(&self, player_id: PlayerId) -> Option<ConnectionId> {
        self.connections
            .values()
            .find(|conn| conn.player_id == Some(player_id))
            .map(|conn| conn.id)
    }

    /// Connections seated in `lobby_id`, in connection id order
    pub fn connections_in(&self, lobby_id: &str) -> Vec<ConnectionId> {
        let mut ids: Vec<ConnectionId> = self
            .connections
            .values()
            .filter(|conn| conn.lobby_id.as_deref() == Some(lobby_id))
            .map(|conn| conn.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Queues a packet for one connection. Returns false if it is gone.
    pub fn send(&self, id: ConnectionId, packet: Packet) -> bool {
        match self.connections.get(&id) {
            Some(conn) => {
                debug!("Queueing {} for connection {}", packet.packet_type(), id);
                conn.push(Outbound::Packet(packet))
            }
            None => false,
        }
    }

    /// Queues a packet for the connection seated as `player_id`
    pub fn send_to_player(&self, player_id: PlayerId, packet: Packet) -> bool {
        match self.find_connection_by_player(player_id) {
            Some(id) => self.send(id, packet),
            None => false,
        }
    }

    /// Queues the same packet for every player of `lobby_id`
    pub fn broadcast(&self, lobby_id: &str, packet: &Packet) {
        if let Some(game) = self.games.get(lobby_id) {
            for player in game.players() {
                self.send_to_player(player.id, packet.clone());
            }
        }
    }

    /// Asks a connection's handler to close its socket
    pub fn close(&self, id: ConnectionId) {
        if let Some(conn) = self.connections.get(&id) {
            conn.push(Outbound::Close);
        }
    }

    pub fn game(&self, lobby_id: &str) -> Option<&Game> {
        self.games.get(lobby_id)
    }

    pub fn game_mut(&mut self, lobby_id: &str) -> Option<&mut Game> {
        self.games.get_mut(lobby_id)
    }

    pub fn insert_game(&mut self, game: Game) {
        self.games.insert(game.lobby_id.clone(), game);
    }

    pub fn remove_game(&mut self, lobby_id: &str) -> Option<Game> {
        self.games.remove(lobby_id)
    }

    pub fn game_count(&self) -> usize {
        self.games.len()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
