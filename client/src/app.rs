//! Terminal front end: registration prompts, board rendering and the move prompt

use crate::error::ClientError;
use crate::game::{Event, Outcome, Session};
use crate::network::Connection;
use log::info;
use shared::Packet;
use std::io::Write;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;

/// Drives one player's session from registration to game over.
///
/// Input arrives as lines on a channel so the prompt can be raced against
/// packets from the server.
pub struct App<S, W> {
    conn: Connection<S>,
    input: mpsc::UnboundedReceiver<String>,
    out: W,
    session: Session,
    move_pending: bool,
}

impl<S, W> App<S, W>
where
    S: AsyncRead + AsyncWrite,
    W: Write,
{
    pub fn new(conn: Connection<S>, input: mpsc::UnboundedReceiver<String>, out: W) -> Self {
        Self {
            conn,
            input,
            out,
            session: Session::new(),
            move_pending: false,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn run(&mut self) -> Result<Option<Outcome>, ClientError> {
        self.register().await?;
        let outcome = self.play().await?;
        if let Err(e) = self.conn.shutdown().await {
            info!("Shutdown failed: {}", e);
        }
        Ok(outcome)
    }

    async fn prompt(&mut self, text: &str) -> Result<String, ClientError> {
        write!(self.out, "{}", text)?;
        self.out.flush()?;
        let line = self.input.recv().await.ok_or(ClientError::InputClosed)?;
        Ok(line.trim().to_string())
    }

    async fn next_packet(&mut self) -> Result<Packet, ClientError> {
        self.conn.recv().await?.ok_or(ClientError::Closed)
    }

    /// Asks for a username and lobby until the server accepts them
    async fn register(&mut self) -> Result<(), ClientError> {
        loop {
            let username = self.prompt("Username: ").await?;
            let lobby_id = self.prompt("Game ID: ").await?;

            self.conn
                .send(&Packet::ConnectRequest { lobby_id, username })
                .await?;

            let reply = self.next_packet().await?;
            match self.session.apply(reply) {
                Event::Registered => break,
                Event::Rejected(message) => {
                    writeln!(self.out, "Error while matchmaking: {}", message)?;
                }
                other => info!("Unexpected reply to registration: {:?}", other),
            }
        }

        writeln!(self.out, "Waiting for opponent")?;
        Ok(())
    }

    /// Plays until the game ends. Returns None if it was aborted.
    async fn play(&mut self) -> Result<Option<Outcome>, ClientError> {
        loop {
            tokio::select! {
                biased;

                packet = self.conn.recv() => {
                    let packet = packet?.ok_or(ClientError::Closed)?;
                    let event = self.session.apply(packet);
                    self.on_event(&event)?;
                    match event {
                        Event::GameOver(outcome) => return Ok(Some(outcome)),
                        Event::ConnectionLost => return Ok(None),
                        _ => {}
                    }
                }
                line = self.input.recv() => {
                    let line = line.ok_or(ClientError::InputClosed)?;
                    self.on_input(&line).await?;
                }
            }
        }
    }

    fn on_event(&mut self, event: &Event) -> Result<(), ClientError> {
        match event {
            Event::OpponentFound => {
                writeln!(self.out, "Game started")?;
            }
            Event::Updated => {
                self.move_pending = false;
                self.render()?;
                self.announce_turn()?;
            }
            Event::Rejected(message) => {
                self.move_pending = false;
                writeln!(self.out, "Server: {}", message)?;
                self.announce_turn()?;
            }
            Event::GameOver(outcome) => {
                self.render()?;
                let banner = match *outcome {
                    Outcome::Won => "You won!",
                    Outcome::Lost => "Sorry you lost :(",
                    Outcome::Draw => "It's a draw!",
                };
                writeln!(self.out, "{}", banner)?;
            }
            Event::ConnectionLost => {
                writeln!(self.out, "Opponent disconnected, game aborted")?;
            }
            Event::Registered | Event::Ignored => {}
        }
        Ok(())
    }

    async fn on_input(&mut self, line: &str) -> Result<(), ClientError> {
        if !self.session.is_my_turn() || self.move_pending {
            writeln!(self.out, "Wait for your turn")?;
            return Ok(());
        }

        match self.session.parse_column(line) {
            Ok(column) => {
                if let Some(packet) = self.session.move_packet(column) {
                    self.conn.send(&packet).await?;
                    self.move_pending = true;
                }
            }
            Err(e) => {
                writeln!(self.out, "{}", e)?;
                write!(self.out, "Move > ")?;
                self.out.flush()?;
            }
        }
        Ok(())
    }

    fn render(&mut self) -> Result<(), ClientError> {
        if let Some(game) = self.session.game() {
            writeln!(self.out, "{}", game.board)?;
        }
        Ok(())
    }

    fn announce_turn(&mut self) -> Result<(), ClientError> {
        if self.session.is_my_turn() {
            write!(self.out, "Your turn! Move > ")?;
            self.out.flush()?;
        } else {
            writeln!(self.out, "Waiting for the next player!")?;
        }
        Ok(())
    }
}
