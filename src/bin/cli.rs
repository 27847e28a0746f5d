//! Runs a §6 text-format scenario file against a fresh engine and checks
//! its trailing `R` line. Grounded in
//! `examples/original_source/Testing/test.cpp`'s gtest fixture, minus
//! gtest; the `clap::Parser`/`Subcommand` shape follows the teacher's
//! `cli.rs`.

use std::path::PathBuf;

use clap::Parser;
use order_book_engine::engine::{Engine, EngineConfig};
use order_book_engine::harness::{self, Action};
use tracing::info;
use tracing_subscriber::FmtSubscriber;

/// Runs a limit-order-book regression scenario file.
#[derive(Parser)]
#[command(name = "engine-cli", version, about = "Replay a text-format order book scenario")]
struct Cli {
    /// Path to a scenario file (A/M/C actions, trailing R line).
    scenario: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder().with_max_level(tracing::Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let text = std::fs::read_to_string(&cli.scenario)?;
    let scenario = harness::parse(&text)?;

    let engine = Engine::new(EngineConfig::default());
    for action in scenario.actions {
        match action {
            Action::Add(order) => {
                engine.add_order(order);
            }
            Action::Modify(modification) => {
                engine.modify_order(modification);
            }
            Action::Cancel(order_id) => engine.cancel_order(order_id),
        }
    }

    let snapshot = engine.snapshot();
    let actual = (engine.size(), snapshot.bids.len(), snapshot.asks.len());
    let expected = (
        scenario.expected.total_orders,
        scenario.expected.bid_levels,
        scenario.expected.ask_levels,
    );

    if actual == expected {
        info!(?actual, "scenario passed");
        Ok(())
    } else {
        anyhow::bail!(
            "scenario {} failed: expected (orders={}, bids={}, asks={}), got (orders={}, bids={}, asks={})",
            cli.scenario.display(),
            expected.0,
            expected.1,
            expected.2,
            actual.0,
            actual.1,
            actual.2,
        );
    }
}
