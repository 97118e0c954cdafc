//! # Connect Four Server Library
//!
//! This library provides the authoritative server for networked two-player
//! Connect Four. Clients connect over TCP (optionally TLS), exchange
//! newline-delimited JSON packets, and the server decides every outcome:
//! who moves first, whether a move is legal, and when a game is won, drawn
//! or abandoned.
//!
//! ## Core Responsibilities
//!
//! ### Matchmaking
//! Players name a lobby when they register. The first player into a lobby
//! creates the game and waits as Red; the second joins as Yellow, a random
//! player is given the first turn and both are told the game has started.
//! Any later registration for that lobby is refused.
//!
//! ### Turn Control
//! Moves are checked against the stored game before anything changes:
//! the game must be running, the sender must be the player whose turn it
//! is and the column must accept a piece. Rejected moves leave the game
//! untouched and only the sender hears about it. Accepted moves are
//! broadcast to both players as a fresh game snapshot.
//!
//! ### Connection Lifecycle
//! When a seated player's socket closes, the game is torn down and the
//! opponent is sent `ConnectionLost` before its own socket is closed.
//!
//! ## Architecture Design
//!
//! ### One Task Per Connection
//! Every accepted socket gets its own tokio task which reads packets from
//! the peer and writes whatever the server queued for it. Tasks never
//! touch each other's sockets; they talk through the registry.
//!
//! ### Single Registry Lock
//! All games and connections live in one [`registry::SessionRegistry`]
//! behind an async mutex. Matchmaking runs with that lock held, so a state
//! transition and the packets it produces happen as one step and two
//! players can never both claim the same seat.
//!
//! ## Module Organization
//!
//! - `config`: listen address and TLS file paths
//! - `connection`: the per-socket read/write loop
//! - `error`: startup and TLS errors
//! - `matchmaking`: packet handling and game lifecycle
//! - `network`: the TCP listener and TLS handshake
//! - `registry`: games, connections and outbound queues
//! - `tls`: certificate and key loading
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::new("127.0.0.1", 60000, false, None, None)?;
//!     let server = Server::bind(&config).await?;
//!
//!     // Accepts players until the task is cancelled
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod matchmaking;
pub mod network;
pub mod registry;
pub mod tls;
