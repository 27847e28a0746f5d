//! Demo HTTP server exposing the matching engine over `axum`. Grounded in
//! the teacher's `main.rs` `Server` subcommand.

use std::sync::Arc;

use clap::Parser;
use order_book_engine::engine::{Engine, EngineConfig};
use order_book_engine::http::{self, AppState};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "engine-server", version, about = "Demo HTTP surface for the matching engine")]
struct Cli {
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Local wall-clock time (HH:MM) at which GoodForDay orders are pruned.
    #[arg(long, default_value = "16:00")]
    prune_at: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let prune_at = chrono::NaiveTime::parse_from_str(&cli.prune_at, "%H:%M")?;
    let engine = Arc::new(Engine::new(EngineConfig { prune_at }));
    let state = AppState { engine };

    let app = http::router(state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", cli.port)).await?;
    tracing::info!(port = cli.port, "engine-server listening");

    let shutdown = order_book_engine::utils::shutdown_token();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    Ok(())
}
