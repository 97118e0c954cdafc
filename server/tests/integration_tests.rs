use server::config::ServerConfig;
use server::matchmaking::{GAME_FULL, NOT_REGISTERED};
use server::network::Server;
use server::registry::SharedRegistry;
use shared::{Cell, Game, GameState, Packet, Player};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

async fn start_server() -> (SocketAddr, SharedRegistry) {
    let config = ServerConfig {
        port: 0,
        ..ServerConfig::default()
    };
    let server = Server::bind(&config).await.unwrap();
    let addr = server.local_addr().unwrap();
    let registry = server.registry();
    tokio::spawn(server.run());
    (addr, registry)
}

struct TestClient {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (reader, writer) = stream.into_split();
        TestClient {
            lines: BufReader::new(reader).lines(),
            writer,
        }
    }

    async fn send(&mut self, packet: &Packet) {
        self.writer
            .write_all(&packet.encode().unwrap())
            .await
            .unwrap();
    }

    async fn send_raw(&mut self, line: &[u8]) {
        self.writer.write_all(line).await.unwrap();
    }

    /// Next packet, or None once the server closed the socket
    async fn try_recv(&mut self) -> Option<Packet> {
        let line = timeout(RECV_TIMEOUT, self.lines.next_line())
            .await
            .expect("timed out waiting for the server")
            .unwrap()?;
        Some(Packet::decode(line.as_bytes()).unwrap())
    }

    async fn recv(&mut self) -> Packet {
        self.try_recv().await.expect("server closed the connection")
    }

    async fn expect_error(&mut self) -> String {
        match self.recv().await {
            Packet::Error { message } => message,
            other => panic!("expected Error, got {:?}", other),
        }
    }

    async fn expect_sync(&mut self) -> Game {
        match self.recv().await {
            Packet::SyncGame { game } => game,
            other => panic!("expected SyncGame, got {:?}", other),
        }
    }

    async fn register(&mut self, lobby_id: &str, username: &str) -> (Player, Game) {
        self.send(&Packet::ConnectRequest {
            lobby_id: lobby_id.to_string(),
            username: username.to_string(),
        })
        .await;
        match self.recv().await {
            Packet::ConnectResponse { player, game } => (player, game),
            other => panic!("expected ConnectResponse, got {:?}", other),
        }
    }

    async fn play(&mut self, lobby_id: &str, player: &Player, column: i64) {
        self.send(&Packet::Move {
            lobby_id: lobby_id.to_string(),
            column,
            player: player.clone(),
        })
        .await;
    }
}

struct Seat {
    client: TestClient,
    player: Player,
}

/// Registers two players into `lobby_id` and returns them as
/// (first to move, second to move, started game)
async fn start_game(addr: SocketAddr, lobby_id: &str) -> (Seat, Seat, Game) {
    let mut alice = TestClient::connect(addr).await;
    let (alice_player, _) = alice.register(lobby_id, "alice").await;

    let mut bob = TestClient::connect(addr).await;
    let (bob_player, _) = bob.register(lobby_id, "bob").await;

    assert_eq!(alice.recv().await, Packet::FoundGame);
    assert_eq!(bob.recv().await, Packet::FoundGame);
    let game = alice.expect_sync().await;
    assert_eq!(bob.expect_sync().await, game);

    let alice = Seat {
        client: alice,
        player: alice_player,
    };
    let bob = Seat {
        client: bob,
        player: bob_player,
    };
    if game.turn == Some(alice.player.id) {
        (alice, bob, game)
    } else {
        (bob, alice, game)
    }
}

#[tokio::test]
async fn test_two_players_start_a_game() {
    let (addr, registry) = start_server().await;

    let mut alice = TestClient::connect(addr).await;
    let (alice_player, waiting) = alice.register("L1", "alice").await;
    assert_eq!(alice_player.name, "alice");
    assert_eq!(waiting.state, GameState::Waiting);
    assert_eq!(waiting.red.as_ref(), Some(&alice_player));
    assert!(waiting.yellow.is_none());

    let mut bob = TestClient::connect(addr).await;
    let (bob_player, joined) = bob.register("L1", "bob").await;
    assert_eq!(joined.yellow.as_ref(), Some(&bob_player));

    assert_eq!(alice.recv().await, Packet::FoundGame);
    assert_eq!(bob.recv().await, Packet::FoundGame);

    let game = alice.expect_sync().await;
    assert_eq!(bob.expect_sync().await, game);
    assert_eq!(game.state, GameState::InProgress);
    let turn = game.turn.unwrap();
    assert!(turn == alice_player.id || turn == bob_player.id);

    assert_eq!(registry.lock().await.game_count(), 1);
}

#[tokio::test]
async fn test_four_in_a_row_ends_the_game() {
    let (addr, registry) = start_server().await;
    let (mut first, mut second, _) = start_game(addr, "L2").await;

    // First mover fills row 0, second stacks on top of it in row 1
    for column in 0..3 {
        first.client.play("L2", &first.player, column).await;
        first.client.expect_sync().await;
        second.client.expect_sync().await;

        second.client.play("L2", &second.player, column).await;
        first.client.expect_sync().await;
        second.client.expect_sync().await;
    }
    first.client.play("L2", &first.player, 3).await;

    let winner_id = first.player.id;
    for client in [&mut first.client, &mut second.client] {
        match client.recv().await {
            Packet::GameOver { game, winner } => {
                assert_eq!(winner.as_ref().map(|w| w.id), Some(winner_id));
                assert_eq!(game.state, GameState::Finished);
                let colour = game.color_of(winner_id).unwrap();
                assert_eq!(game.board.check_win(), Some(colour));
            }
            other => panic!("expected GameOver, got {:?}", other),
        }
    }
    assert_eq!(registry.lock().await.game_count(), 0);

    // Socket stays open but is no longer seated anywhere
    let stale = Game::new("L2", second.player.clone());
    second.client.send(&Packet::SyncGame { game: stale }).await;
    assert_eq!(second.client.expect_error().await, NOT_REGISTERED);
}

#[tokio::test]
async fn test_third_player_is_refused() {
    let (addr, _registry) = start_server().await;
    let (_first, _second, _) = start_game(addr, "L3").await;

    let mut carol = TestClient::connect(addr).await;
    carol
        .send(&Packet::ConnectRequest {
            lobby_id: "L3".to_string(),
            username: "carol".to_string(),
        })
        .await;
    assert_eq!(carol.expect_error().await, GAME_FULL);

    // Refused, not disconnected: another lobby still works
    let (_, game) = carol.register("L3b", "carol").await;
    assert_eq!(game.state, GameState::Waiting);
}

#[tokio::test]
async fn test_disconnect_aborts_game() {
    let (addr, registry) = start_server().await;
    let (mut first, second, _) = start_game(addr, "L4").await;

    drop(second);

    assert_eq!(first.client.try_recv().await, Some(Packet::ConnectionLost));
    assert_eq!(first.client.try_recv().await, None);
    assert!(registry.lock().await.game("L4").is_none());
}

#[tokio::test]
async fn test_invalid_moves_change_nothing() {
    let (addr, _registry) = start_server().await;
    let (mut first, mut second, before) = start_game(addr, "L5").await;

    first.client.play("L5", &first.player, 99).await;
    assert_eq!(first.client.expect_error().await, "Invalid column 99");

    first.client.play("L5", &first.player, -1).await;
    assert_eq!(first.client.expect_error().await, "Invalid column -1");

    second.client.play("L5", &second.player, 0).await;
    assert_eq!(second.client.expect_error().await, "Not your turn");

    // Moving as someone else is refused too
    second.client.play("L5", &first.player, 0).await;
    assert_eq!(
        second.client.expect_error().await,
        "Not a player in this game"
    );

    first.client.send(&Packet::SyncGame { game: before.clone() }).await;
    let after = first.client.expect_sync().await;
    assert_eq!(after, before);
    assert_eq!(after.board.get(0, 0).unwrap(), Cell::Empty);
}

#[tokio::test]
async fn test_full_column_is_rejected() {
    let (addr, _registry) = start_server().await;
    let (mut first, mut second, game) = start_game(addr, "L6").await;

    for _ in 0..game.board.rows() / 2 {
        first.client.play("L6", &first.player, 0).await;
        first.client.expect_sync().await;
        second.client.expect_sync().await;
        second.client.play("L6", &second.player, 0).await;
        first.client.expect_sync().await;
        second.client.expect_sync().await;
    }

    first.client.play("L6", &first.player, 0).await;
    assert_eq!(first.client.expect_error().await, "Column 0 is full");
}

#[tokio::test]
async fn test_garbage_keeps_connection_open() {
    let (addr, _registry) = start_server().await;
    let mut client = TestClient::connect(addr).await;

    client.send_raw(b"this is not json\n").await;
    assert!(client.expect_error().await.starts_with("Invalid packet"));

    client
        .send_raw(b"{\"packet_type\":\"Teleport\"}\n")
        .await;
    assert!(client.expect_error().await.starts_with("Invalid packet"));

    client.send(&Packet::FoundGame).await;
    assert_eq!(client.expect_error().await, "Unexpected packet");

    let (player, _) = client.register("L7", "dora").await;
    assert_eq!(player.name, "dora");
}
