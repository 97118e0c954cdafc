use clap::Parser;
use client::app::App;
use client::input::spawn_stdin_reader;
use client::network::{connect, ClientConfig};
use log::info;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server host name or IP address
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short, long, default_value_t = shared::DEFAULT_PORT)]
    port: u16,

    /// Connect with TLS
    #[arg(long)]
    tls: bool,

    /// PEM certificate to trust for the server (with --tls)
    #[arg(long)]
    cert: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let config = ClientConfig::new(args.host, args.port, args.tls, args.cert)?;

    info!("Connecting to {}:{}", config.host, config.port);
    let conn = connect(&config).await?;

    let mut app = App::new(conn, spawn_stdin_reader(), std::io::stdout());
    app.run().await?;

    Ok(())
}
