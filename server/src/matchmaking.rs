//! Matchmaking and turn control
//!
//! Every function here runs with the registry lock held and performs one
//! complete transition: it validates the request, mutates the game and
//! queues every resulting packet before returning. Rejected requests are
//! answered with an Error packet and change nothing.
//!
//! Lifecycle of a lobby:
//! - first ConnectRequest creates the game, WAITING, requester is red
//! - second ConnectRequest seats yellow, announces FoundGame, picks the
//!   first mover at random and moves to IN_PROGRESS
//! - a winning or board-filling Move finishes it and removes it
//! - a disconnect of either player aborts it and removes it

use crate::registry::{ConnectionId, SessionRegistry};
use log::{debug, info, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use shared::{Game, GameState, MoveError, MoveOutcome, Packet, Player};

pub const GAME_FULL: &str = "Game already full";
pub const NOT_REGISTERED: &str = "Not Registered";
pub const ALREADY_REGISTERED: &str = "Already registered";
pub const UNEXPECTED_PACKET: &str = "Unexpected packet";

/// Routes one decoded packet from connection `conn`
pub fn handle_packet<R: Rng + ?Sized>(
    registry: &mut SessionRegistry,
    conn: ConnectionId,
    packet: Packet,
    rng: &mut R,
) {
    match packet {
        Packet::ConnectRequest { lobby_id, username } => {
            handle_connect_request(registry, conn, &lobby_id, &username, rng);
        }
        Packet::Move {
            lobby_id,
            column,
            player,
        } => {
            handle_move(registry, conn, &lobby_id, column, &player);
        }
        Packet::SyncGame { .. } => {
            handle_sync_game(registry, conn);
        }
        other => {
            warn!(
                "Connection {} sent server-only packet {}",
                conn,
                other.packet_type()
            );
            registry.send(conn, Packet::error(UNEXPECTED_PACKET));
        }
    }
}

pub fn handle_connect_request<R: Rng + ?Sized>(
    registry: &mut SessionRegistry,
    conn: ConnectionId,
    lobby_id: &str,
    username: &str,
    rng: &mut R,
) {
    if registry.lobby_of(conn).is_some() {
        registry.send(conn, Packet::error(ALREADY_REGISTERED));
        return;
    }

    let player = Player::new(username);

    if registry.game(lobby_id).is_none() {
        let game = Game::new(lobby_id, player.clone());
        info!(
            "{} ({}) opened game {:?}, waiting for an opponent",
            player.name, player.id, lobby_id
        );
        registry.seat(conn, lobby_id, player.id);
        registry.send(
            conn,
            Packet::ConnectResponse {
                player,
                game: game.clone(),
            },
        );
        registry.insert_game(game);
        return;
    }

    let Some(game) = registry.game_mut(lobby_id) else {
        return;
    };
    if game.state != GameState::Waiting || game.join(player.clone()).is_err() {
        debug!("Connection {} refused: {:?} is full", conn, lobby_id);
        registry.send(conn, Packet::error(GAME_FULL));
        return;
    }

    let red_id = game.red.as_ref().map_or(player.id, |red| red.id);
    let first = [red_id, player.id].choose(rng).copied().unwrap_or(red_id);
    let response = Packet::ConnectResponse {
        player: player.clone(),
        game: game.clone(),
    };
    game.start(first);
    let sync = Packet::SyncGame { game: game.clone() };

    info!(
        "{} joined game {:?}; game starts, {} moves first",
        player.name, lobby_id, first
    );
    registry.seat(conn, lobby_id, player.id);
    registry.send(conn, response);
    registry.broadcast(lobby_id, &Packet::FoundGame);
    registry.broadcast(lobby_id, &sync);
}

pub fn handle_sync_game(registry: &mut SessionRegistry, conn: ConnectionId) {
    let game = registry
        .lobby_of(conn)
        .and_then(|lobby_id| registry.game(lobby_id))
        .cloned();

    match game {
        Some(game) => {
            registry.send(conn, Packet::SyncGame { game });
        }
        None => {
            registry.send(conn, Packet::error(NOT_REGISTERED));
        }
    }
}

pub fn handle_move(
    registry: &mut SessionRegistry,
    conn: ConnectionId,
    lobby_id: &str,
    column: i64,
    player: &Player,
) {
    let seated_as = registry.connection(conn).and_then(|c| c.player_id);
    if registry.lobby_of(conn) != Some(lobby_id) {
        registry.send(conn, Packet::error(NOT_REGISTERED));
        return;
    }
    if seated_as != Some(player.id) {
        registry.send(conn, Packet::error(MoveError::UnknownPlayer.to_string()));
        return;
    }

    let Some(game) = registry.game_mut(lobby_id) else {
        registry.send(conn, Packet::error(NOT_REGISTERED));
        return;
    };

    match game.apply_move(player.id, column) {
        Err(err) => {
            debug!(
                "Rejected move by {} in {:?} column {}: {}",
                player.name, lobby_id, column, err
            );
            registry.send(conn, Packet::error(err.to_string()));
        }
        Ok(MoveOutcome::Continue) => {
            let sync = Packet::SyncGame { game: game.clone() };
            registry.broadcast(lobby_id, &sync);
        }
        Ok(MoveOutcome::Won(winner)) => {
            info!("{} won game {:?}", winner.name, lobby_id);
            let over = Packet::GameOver {
                game: game.clone(),
                winner: Some(winner),
            };
            finish_game(registry, lobby_id, &over);
        }
        Ok(MoveOutcome::Draw) => {
            info!("Game {:?} ended in a draw", lobby_id);
            let over = Packet::GameOver {
                game: game.clone(),
                winner: None,
            };
            finish_game(registry, lobby_id, &over);
        }
    }
}

/// Broadcasts the final packet, then forgets the game. Both sockets stay open.
fn finish_game(registry: &mut SessionRegistry, lobby_id: &str, over: &Packet) {
    registry.broadcast(lobby_id, over);
    registry.remove_game(lobby_id);
    registry.unseat_all(lobby_id);
}

/// Tears down everything owned by a closed connection.
///
/// A game the connection was seated in is aborted: the other player gets
/// ConnectionLost, is unseated and has its socket closed.
pub fn handle_disconnect(registry: &mut SessionRegistry, conn: ConnectionId) {
    let Some(connection) = registry.remove_connection(conn) else {
        return;
    };
    let Some(lobby_id) = connection.lobby_id else {
        return;
    };

    if let Some(game) = registry.remove_game(&lobby_id) {
        info!(
            "Game {:?} aborted while {:?}: connection {} closed",
            lobby_id, game.state, conn
        );
    }

    for survivor in registry.unseat_all(&lobby_id) {
        registry.send(survivor, Packet::ConnectionLost);
        registry.close(survivor);
    }
}
