use clap::Parser;
use log::{error, info};
use server::config::ServerConfig;
use server::network::Server;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[clap(short, long, default_value_t = shared::DEFAULT_PORT)]
    port: u16,

    /// Serve TLS instead of plain TCP
    #[clap(long)]
    tls: bool,

    /// PEM certificate chain (with --tls)
    #[clap(long)]
    cert: Option<PathBuf>,

    /// PEM private key (with --tls)
    #[clap(long)]
    key: Option<PathBuf>,

    /// Log filter such as "info" or "server=debug"; RUST_LOG takes precedence
    #[clap(long, default_value = "info")]
    log_level: String,
}

/// Parses command-line arguments, binds the listener and serves players
/// until the listener fails or Ctrl+C is pressed.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    env_logger::Builder::new()
        .parse_filters(&args.log_level)
        .parse_default_env()
        .init();

    let config = ServerConfig::new(args.host, args.port, args.tls, args.cert, args.key)?;
    let server = Server::bind(&config).await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server stopped: {}", e);
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
