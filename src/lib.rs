//! A single-instrument, price-time priority limit order matching engine.
//!
//! [`engine::Engine`] is the public entry point: `add_order`, `cancel_order`,
//! `modify_order`, `snapshot`, `size`. Everything else in this crate is
//! either a building block it's composed from (`types`, `order`, `level`,
//! `book`, `trade`), ambient plumbing (`errors`, `pruner`), or an external
//! collaborator layered on top (`harness`, `http`).

pub mod book;
pub mod engine;
pub mod errors;
pub mod harness;
pub mod http;
pub mod level;
pub mod order;
pub mod pruner;
pub mod trade;
pub mod types;
pub mod utils;

pub use engine::{BookSnapshot, Engine, EngineConfig, LevelInfo, OrderModify};
pub use errors::{ParseError, RejectReason};
pub use order::Order;
pub use trade::{Trade, TradeInfo};
pub use types::{OrderId, OrderType, Price, Quantity, Side};
