//! Primitive domain vocabulary shared by every other module.

use serde::{Deserialize, Serialize};

/// Limit price. Absent only for a `Market` order before admission rewrite.
pub type Price = i32;

/// Order quantity; always > 0 for a live order.
pub type Quantity = u32;

/// Client-assigned order identifier.
pub type OrderId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    GoodTillCancel,
    GoodForDay,
    FillAndKill,
    FillOrKill,
    Market,
}
