//! # Connect Four Client Library
//!
//! A terminal client for the Connect Four server. It registers into a
//! lobby, waits for an opponent, renders the board after every update and
//! prompts for a column whenever it is the local player's turn.
//!
//! ## Module Organization
//!
//! ### Network Module (`network`)
//! Opens the TCP connection, optionally wrapped in TLS, and frames packets
//! as one JSON object per line. Receiving is safe to race in `select!`.
//!
//! ### Game Module (`game`)
//! The client's copy of the game. Server packets are folded into a
//! [`game::Session`], which reports what each one meant (registered, board
//! updated, game won/lost/drawn, opponent gone). The server stays the
//! authority; the session only checks typed columns before sending them.
//!
//! ### Input Module (`input`)
//! Reads stdin lines on a background thread and hands them over a channel.
//!
//! ### App Module (`app`)
//! Ties the three together. While waiting for the player to type a move it
//! keeps reading from the server, so an opponent leaving mid-prompt is
//! reported straight away.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::app::App;
//! use client::input::spawn_stdin_reader;
//! use client::network::{connect, ClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new("127.0.0.1", 60000, false, None)?;
//!     let conn = connect(&config).await?;
//!
//!     let mut app = App::new(conn, spawn_stdin_reader(), std::io::stdout());
//!     app.run().await?;
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod error;
pub mod game;
pub mod input;
pub mod network;
