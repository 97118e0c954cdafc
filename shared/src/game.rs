//! Game record shared by server and client, plus the pure turn rules

use crate::board::{Board, Cell};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub type PlayerId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
}

impl Player {
    /// Creates a player with a fresh random id
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    Waiting,
    InProgress,
    Finished,
    Aborted,
}

/// Why a move was refused. The game is left untouched in every case.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoveError {
    #[error("Game not in progress")]
    NotInProgress,

    #[error("Not a player in this game")]
    UnknownPlayer,

    #[error("Not your turn")]
    NotYourTurn,

    #[error("Invalid column {0}")]
    InvalidColumn(i64),

    #[error("Column {0} is full")]
    ColumnFull(usize),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JoinError {
    #[error("Game already full")]
    Full,
}

/// Result of an accepted move
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Play continues with the other player
    Continue,
    /// The mover completed four in a row
    Won(Player),
    /// The board filled up without a winner
    Draw,
}

/// A lobby and its authoritative board.
///
/// Red is always the first registrant. `turn` is only meaningful while the
/// state is [`GameState::InProgress`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub lobby_id: String,
    pub red: Option<Player>,
    pub yellow: Option<Player>,
    pub turn: Option<PlayerId>,
    pub board: Board,
    pub state: GameState,
}

impl Game {
    /// Opens a lobby with `red` waiting for an opponent
    pub fn new(lobby_id: impl Into<String>, red: Player) -> Self {
        Self {
            lobby_id: lobby_id.into(),
            red: Some(red),
            yellow: None,
            turn: None,
            board: Board::new(),
            state: GameState::Waiting,
        }
    }

    pub fn is_full(&self) -> bool {
        self.red.is_some() && self.yellow.is_some()
    }

    /// Seats `player` in the first free slot
    pub fn join(&mut self, player: Player) -> Result<(), JoinError> {
        if self.red.is_none() {
            self.red = Some(player);
        } else if self.yellow.is_none() {
            self.yellow = Some(player);
        } else {
            return Err(JoinError::Full);
        }
        Ok(())
    }

    /// Starts play with `first` to move
    pub fn start(&mut self, first: PlayerId) {
        self.turn = Some(first);
        self.state = GameState::InProgress;
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.red.iter().chain(self.yellow.iter())
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players().find(|p| p.id == id)
    }

    pub fn color_of(&self, id: PlayerId) -> Option<Cell> {
        if self.red.as_ref().is_some_and(|p| p.id == id) {
            Some(Cell::Red)
        } else if self.yellow.as_ref().is_some_and(|p| p.id == id) {
            Some(Cell::Yellow)
        } else {
            None
        }
    }

    pub fn player_with_color(&self, color: Cell) -> Option<&Player> {
        match color {
            Cell::Red => self.red.as_ref(),
            Cell::Yellow => self.yellow.as_ref(),
            Cell::Empty => None,
        }
    }

    pub fn opponent_of(&self, id: PlayerId) -> Option<&Player> {
        match self.color_of(id)? {
            Cell::Red => self.yellow.as_ref(),
            _ => self.red.as_ref(),
        }
    }

    /// Applies a move for `player_id` into `column`.
    ///
    /// Validation happens before any mutation, so a rejected move leaves the
    /// board, turn and state exactly as they were. On success the turn
    /// passes to the opponent and a win or draw finishes the game.
    pub fn apply_move(&mut self, player_id: PlayerId, column: i64) -> Result<MoveOutcome, MoveError> {
        if self.state != GameState::InProgress {
            return Err(MoveError::NotInProgress);
        }
        let color = self.color_of(player_id).ok_or(MoveError::UnknownPlayer)?;
        if self.turn != Some(player_id) {
            return Err(MoveError::NotYourTurn);
        }
        let col = usize::try_from(column)
            .ok()
            .filter(|c| *c < self.board.cols())
            .ok_or(MoveError::InvalidColumn(column))?;
        let next = self
            .opponent_of(player_id)
            .map(|p| p.id)
            .ok_or(MoveError::UnknownPlayer)?;

        if !self.board.drop_piece(col, color) {
            return Err(MoveError::ColumnFull(col));
        }
        self.turn = Some(next);

        if let Some(winner) = self.board.check_win() {
            self.state = GameState::Finished;
            let player = self
                .player_with_color(winner)
                .cloned()
                .ok_or(MoveError::UnknownPlayer)?;
            return Ok(MoveOutcome::Won(player));
        }
        if self.board.is_full() {
            self.state = GameState::Finished;
            return Ok(MoveOutcome::Draw);
        }
        Ok(MoveOutcome::Continue)
    }
}
