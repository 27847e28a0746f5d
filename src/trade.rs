//! Completed-trade value types returned by the matching engine.

use serde::{Deserialize, Serialize};

use crate::types::{OrderId, Price, Quantity};

/// One side's view of a completed fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeInfo {
    pub order_id: OrderId,
    pub price: Price,
    pub quantity: Quantity,
}

/// A single match between a resting bid and a resting ask. The price on
/// each side is the resting (maker) order's price, not a derived mid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub bid: TradeInfo,
    pub ask: TradeInfo,
}
