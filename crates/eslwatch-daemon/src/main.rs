//! eslwatch - standalone event subscriber.
//!
//! Composition root: builds the single per-process [`Subscriber`],
//! runs it until interrupted, then prints a final status snapshot.

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use eslwatch_daemon::{Subscriber, SubscriberConfig};

#[derive(Parser, Debug)]
#[command(name = "eslwatch", version, about = "Subscribe to switch events over the event socket")]
struct Cli {
    /// Switch host (overrides ESL_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Event socket port (overrides ESL_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Shared secret (overrides ESL_PASSWORD)
    #[arg(long)]
    password: Option<String>,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let mut config = SubscriberConfig::from_env()?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(password) = cli.password {
        config.password = password;
    }

    let subscriber = Subscriber::new(config);
    subscriber.start();

    tokio::signal::ctrl_c().await?;
    info!("interrupt received, shutting down");
    subscriber.stop().await;

    let status = subscriber.status();
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}
