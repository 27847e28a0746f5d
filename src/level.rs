//! The FIFO queue of resting orders at a single price, and the incremental
//! per-price aggregate cache that accelerates `FillOrKill` feasibility checks.

use std::collections::{HashMap, VecDeque};

use crate::order::Order;
use crate::types::{OrderId, Price, Quantity};

/// FIFO queue of orders resting at one price on one side of the book.
#[derive(Debug, Default)]
pub struct Level {
    orders: VecDeque<Order>,
}

impl Level {
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn push_back(&mut self, order: Order) {
        self.orders.push_back(order);
    }

    pub fn front(&self) -> Option<&Order> {
        self.orders.front()
    }

    pub fn front_mut(&mut self) -> Option<&mut Order> {
        self.orders.front_mut()
    }

    pub fn pop_front(&mut self) -> Option<Order> {
        self.orders.pop_front()
    }

    /// Removes the order with the given id, wherever it sits in the queue.
    /// O(n) in level depth: see DESIGN.md's Open Question decision on this
    /// tradeoff.
    pub fn remove(&mut self, order_id: OrderId) -> Option<Order> {
        let pos = self.orders.iter().position(|o| o.id() == order_id)?;
        self.orders.remove(pos)
    }

    pub fn contains(&self, order_id: OrderId) -> bool {
        self.orders.iter().any(|o| o.id() == order_id)
    }

    pub fn find(&self, order_id: OrderId) -> Option<&Order> {
        self.orders.iter().find(|o| o.id() == order_id)
    }

    pub fn total_quantity(&self) -> Quantity {
        self.orders.iter().map(Order::remaining_qty).sum()
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }
}

/// Per-price aggregate: total resting quantity and order count. Maintained
/// incrementally so `CanFullyFill` never has to walk a `Level`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevelData {
    pub quantity: Quantity,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelAction {
    Add,
    Remove,
    Match,
}

/// `Price -> LevelData` cache, one instance shared across both sides (prices
/// are assumed distinct across bid/ask in a single-instrument book, matching
/// the original's single `data_` map keyed only by price).
#[derive(Debug, Default)]
pub struct LevelCache {
    data: HashMap<Price, LevelData>,
}

impl LevelCache {
    pub fn get(&self, price: Price) -> LevelData {
        self.data.get(&price).copied().unwrap_or_default()
    }

    /// Applies an Add/Remove/Match action to the entry for `price`, erasing
    /// it once its order count reaches zero.
    pub fn update(&mut self, price: Price, qty: Quantity, action: LevelAction) {
        let entry = self.data.entry(price).or_default();
        match action {
            LevelAction::Add => {
                entry.count += 1;
                entry.quantity += qty;
            }
            LevelAction::Remove => {
                entry.count -= 1;
                entry.quantity -= qty;
            }
            LevelAction::Match => {
                entry.quantity -= qty;
            }
        }
        if entry.count == 0 {
            self.data.remove(&price);
        }
    }
}
