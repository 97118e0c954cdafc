//! Types shared by the Connect Four server and client: the board engine,
//! the game record and the line-delimited packet codec.

pub mod board;
pub mod game;
pub mod packet;

pub use board::{Board, BoardError, Cell, DEFAULT_COLS, DEFAULT_ROWS};
pub use game::{Game, GameState, JoinError, MoveError, MoveOutcome, Player, PlayerId};
pub use packet::{CodecError, Packet, MAX_LINE_LEN};

/// Port used when none is given on the command line
pub const DEFAULT_PORT: u16 = 60000;
