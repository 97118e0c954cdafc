use log::{debug, warn};
use shared::{Game, GameState, Packet, Player};
use thiserror::Error;

/// Where the local player is in the lobby lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Unregistered,
    Waiting,
    Playing,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Won,
    Lost,
    Draw,
}

/// What a packet from the server meant for the player
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Registered,
    Rejected(String),
    OpponentFound,
    Updated,
    GameOver(Outcome),
    ConnectionLost,
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Enter a valid integer")]
    NotANumber,
    #[error("Enter a valid column (0-{max})")]
    OutOfRange { max: usize },
}

/// The client's view of its game, fed by server packets
#[derive(Debug, Clone)]
pub struct Session {
    phase: Phase,
    player: Option<Player>,
    game: Option<Game>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            phase: Phase::Unregistered,
            player: None,
            game: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn player(&self) -> Option<&Player> {
        self.player.as_ref()
    }

    pub fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    pub fn is_my_turn(&self) -> bool {
        match (&self.game, &self.player) {
            (Some(game), Some(player)) => {
                self.phase == Phase::Playing
                    && game.state == GameState::InProgress
                    && game.turn == Some(player.id)
            }
            _ => false,
        }
    }

    /// Folds one server packet into the session
    pub fn apply(&mut self, packet: Packet) -> Event {
        match packet {
            Packet::ConnectResponse { player, game } => {
                debug!("Registered as {} in {:?}", player.id, game.lobby_id);
                self.player = Some(player);
                self.game = Some(game);
                self.phase = Phase::Waiting;
                Event::Registered
            }
            Packet::Error { message } => Event::Rejected(message),
            Packet::FoundGame => {
                self.phase = Phase::Playing;
                Event::OpponentFound
            }
            Packet::SyncGame { game } => {
                if self.phase == Phase::Waiting {
                    self.phase = Phase::Playing;
                }
                self.game = Some(game);
                Event::Updated
            }
            Packet::GameOver { game, winner } => {
                let me = self.player.as_ref().map(|p| p.id);
                let outcome = match winner {
                    None => Outcome::Draw,
                    Some(winner) if Some(winner.id) == me => Outcome::Won,
                    Some(_) => Outcome::Lost,
                };
                self.game = Some(game);
                self.phase = Phase::Finished;
                Event::GameOver(outcome)
            }
            Packet::ConnectionLost => {
                if let Some(game) = self.game.as_mut() {
                    game.state = GameState::Aborted;
                }
                self.phase = Phase::Finished;
                Event::ConnectionLost
            }
            other => {
                warn!("Ignoring {} from server", other.packet_type());
                Event::Ignored
            }
        }
    }

    /// Checks a typed column before it is sent
    pub fn parse_column(&self, input: &str) -> Result<i64, InputError> {
        let column: i64 = input.trim().parse().map_err(|_| InputError::NotANumber)?;
        let cols = self
            .game
            .as_ref()
            .map_or(shared::DEFAULT_COLS, |g| g.board.cols());
        if column < 0 || column as usize >= cols {
            return Err(InputError::OutOfRange {
                max: cols.saturating_sub(1),
            });
        }
        Ok(column)
    }

    pub fn move_packet(&self, column: i64) -> Option<Packet> {
        let game = self.game.as_ref()?;
        let player = self.player.clone()?;
        Some(Packet::Move {
            lobby_id: game.lobby_id.clone(),
            column,
            player,
        })
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
