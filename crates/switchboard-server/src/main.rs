//! Switchboard server binary.
//!
//! # Usage
//!
//! ```bash
//! # Listen on the default port
//! switchboard-server
//!
//! # Custom bind address and verbose logging
//! switchboard-server --bind 127.0.0.1:8080 --log-level debug
//! ```

use clap::Parser;
use switchboard_server::{Server, ServerRuntimeConfig};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Switchboard signaling relay
#[derive(Parser, Debug)]
#[command(name = "switchboard-server")]
#[command(about = "Rendezvous and signaling relay for peer-to-peer media sessions")]
#[command(version)]
struct Args {
    /// Address to bind to
    #[arg(short, long, default_value = "0.0.0.0:3000")]
    bind: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("Switchboard server starting");
    tracing::info!("Binding to {}", args.bind);

    let config = ServerRuntimeConfig { bind_address: args.bind };

    let server = Server::bind(config).await?;

    tracing::info!("Server listening on {}", server.local_addr()?);

    server.run().await?;

    Ok(())
}
