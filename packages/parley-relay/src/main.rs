//! Parley relay server binary.

use clap::Parser;

use parley_relay::{build_router, RelayConfig, RelayState};

// ── CLI Arguments ─────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "parley-relay", version, about = "Parley presence and private message relay")]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0", env = "RELAY_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 3001, env = "RELAY_PORT")]
    port: u16,

    /// Maximum private message content size in bytes
    #[arg(long, default_value_t = 64 * 1024, env = "MAX_MESSAGE_BYTES")]
    max_message_bytes: usize,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

impl From<Args> for RelayConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            max_message_bytes: args.max_message_bytes,
        }
    }
}

// ── Entry Point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "parley_relay=info,tower_http=info".into());
    if args.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = RelayConfig::from(args);
    let addr = format!("{}:{}", config.host, config.port);
    let app = build_router(RelayState::new(config));

    tracing::info!("Parley relay server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await
}

// ── Tests ─────────────────────────────────────────────────────────────────────
