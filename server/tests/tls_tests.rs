use client::network::{connect, BoxedStream, ClientConfig, Connection};
use server::config::{ServerConfig, TlsPaths};
use server::network::Server;
use server::registry::SharedRegistry;
use shared::{GameState, Packet};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Self-signed certificate for "localhost", written out as PEM files
fn write_cert(dir: &TempDir) -> TlsPaths {
    let certified = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    let cert = dir.path().join("cert.pem");
    let key = dir.path().join("key.pem");
    std::fs::write(&cert, certified.cert.pem()).unwrap();
    std::fs::write(&key, certified.key_pair.serialize_pem()).unwrap();
    TlsPaths { cert, key }
}

async fn start_tls_server(paths: TlsPaths) -> (u16, SharedRegistry) {
    let config = ServerConfig {
        port: 0,
        tls: Some(paths),
        ..ServerConfig::default()
    };
    let server = Server::bind(&config).await.unwrap();
    let port = server.local_addr().unwrap().port();
    let registry = server.registry();
    tokio::spawn(server.run());
    (port, registry)
}

async fn connect_tls(port: u16, cert: PathBuf) -> Connection<BoxedStream> {
    let config = ClientConfig::new("localhost", port, true, Some(cert)).unwrap();
    timeout(RECV_TIMEOUT, connect(&config))
        .await
        .expect("timed out connecting")
        .unwrap()
}

async fn register(conn: &mut Connection<BoxedStream>, lobby_id: &str, username: &str) -> Packet {
    conn.send(&Packet::ConnectRequest {
        lobby_id: lobby_id.to_string(),
        username: username.to_string(),
    })
    .await
    .unwrap();
    timeout(RECV_TIMEOUT, conn.recv())
        .await
        .expect("timed out waiting for the server")
        .unwrap()
        .expect("server closed the connection")
}

#[tokio::test]
async fn test_tls_registration_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_cert(&dir);
    let cert = paths.cert.clone();
    let (port, registry) = start_tls_server(paths).await;

    let mut alice = connect_tls(port, cert.clone()).await;
    match register(&mut alice, "L1", "alice").await {
        Packet::ConnectResponse { player, game } => {
            assert_eq!(player.name, "alice");
            assert_eq!(game.lobby_id, "L1");
            assert_eq!(game.state, GameState::Waiting);
        }
        other => panic!("expected ConnectResponse, got {:?}", other),
    }

    let mut bob = connect_tls(port, cert).await;
    assert!(matches!(
        register(&mut bob, "L1", "bob").await,
        Packet::ConnectResponse { .. }
    ));
    assert_eq!(
        timeout(RECV_TIMEOUT, alice.recv()).await.unwrap().unwrap(),
        Some(Packet::FoundGame)
    );

    let registry = registry.lock().await;
    assert_eq!(
        registry.game("L1").map(|game| game.state),
        Some(GameState::InProgress)
    );
}

#[tokio::test]
async fn test_plain_client_does_not_disturb_tls_listener() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_cert(&dir);
    let cert = paths.cert.clone();
    let (port, registry) = start_tls_server(paths).await;

    let mut plain = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    let request = Packet::ConnectRequest {
        lobby_id: "PLAIN".to_string(),
        username: "mallory".to_string(),
    };
    plain.write_all(&request.encode().unwrap()).await.unwrap();

    // The handshake fails; whatever comes back, the socket must end
    let mut rest = Vec::new();
    let _ = timeout(RECV_TIMEOUT, plain.read_to_end(&mut rest))
        .await
        .expect("server kept the plain socket open");
    assert!(!rest.windows(11).any(|w| w == b"packet_type"));

    let mut alice = connect_tls(port, cert).await;
    assert!(matches!(
        register(&mut alice, "L1", "alice").await,
        Packet::ConnectResponse { .. }
    ));

    let registry = registry.lock().await;
    assert!(registry.game("PLAIN").is_none());
    assert_eq!(registry.game_count(), 1);
}
