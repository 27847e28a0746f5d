//! One side of the book: a price-indexed, time-ordered collection of
//! [`Level`]s. Bids are walked best-first in descending price order; asks
//! best-first in ascending order.

use std::collections::BTreeMap;

use crate::level::Level;
use crate::order::Order;
use crate::types::{OrderId, Price, Side};

pub struct BookSide {
    side: Side,
    levels: BTreeMap<Price, Level>,
}

impl BookSide {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn get(&self, price: Price) -> Option<&Level> {
        self.levels.get(&price)
    }

    pub fn get_mut(&mut self, price: Price) -> Option<&mut Level> {
        self.levels.get_mut(&price)
    }

    /// All prices currently carrying a level, in no particular order. Used
    /// by cancellation's price scan.
    pub fn prices(&self) -> impl Iterator<Item = Price> + '_ {
        self.levels.keys().copied()
    }

    /// Finds a live order anywhere on this side by id. O(levels × level
    /// depth); used only off the matching hot path (cancel, modify, prune).
    pub fn find(&self, order_id: OrderId) -> Option<&Order> {
        self.levels.values().find_map(|level| level.find(order_id))
    }

    pub fn entry(&mut self, price: Price) -> &mut Level {
        self.levels.entry(price).or_default()
    }

    /// Drops the level at `price` if it has gone empty. No-op otherwise.
    pub fn prune_if_empty(&mut self, price: Price) {
        if self.levels.get(&price).is_some_and(Level::is_empty) {
            self.levels.remove(&price);
        }
    }

    /// The most aggressive resting price: highest bid, lowest ask.
    pub fn best_price(&self) -> Option<Price> {
        match self.side {
            Side::Buy => self.levels.keys().next_back().copied(),
            Side::Sell => self.levels.keys().next().copied(),
        }
    }

    /// The least aggressive resting price: lowest bid, highest ask. Used to
    /// pin a Market order's rewritten limit price.
    pub fn worst_price(&self) -> Option<Price> {
        match self.side {
            Side::Buy => self.levels.keys().next().copied(),
            Side::Sell => self.levels.keys().next_back().copied(),
        }
    }

    /// Walks price levels in best-first priority order (descending for
    /// bids, ascending for asks) — used by `CanFullyFill` and `Snapshot`.
    pub fn iter_priority_order(&self) -> Box<dyn DoubleEndedIterator<Item = (Price, &Level)> + '_> {
        match self.side {
            Side::Buy => Box::new(self.levels.iter().rev().map(|(p, l)| (*p, l))),
            Side::Sell => Box::new(self.levels.iter().map(|(p, l)| (*p, l))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::Order;
    use crate::types::OrderType;

    #[test]
    fn bid_side_orders_descending() {
        let mut side = BookSide::new(Side::Buy);
        side.entry(100)
            .push_back(Order::new(OrderType::GoodTillCancel, 1, Side::Buy, 100, 1));
        side.entry(105)
            .push_back(Order::new(OrderType::GoodTillCancel, 2, Side::Buy, 105, 1));
        side.entry(95)
            .push_back(Order::new(OrderType::GoodTillCancel, 3, Side::Buy, 95, 1));

        assert_eq!(side.best_price(), Some(105));
        assert_eq!(side.worst_price(), Some(95));
        let prices: Vec<Price> = side.iter_priority_order().map(|(p, _)| p).collect();
        assert_eq!(prices, vec![105, 100, 95]);
    }

    #[test]
    fn ask_side_orders_ascending() {
        let mut side = BookSide::new(Side::Sell);
        side.entry(105)
            .push_back(Order::new(OrderType::GoodTillCancel, 1, Side::Sell, 105, 1));
        side.entry(100)
            .push_back(Order::new(OrderType::GoodTillCancel, 2, Side::Sell, 100, 1));

        assert_eq!(side.best_price(), Some(100));
        assert_eq!(side.worst_price(), Some(105));
        let prices: Vec<Price> = side.iter_priority_order().map(|(p, _)| p).collect();
        assert_eq!(prices, vec![100, 105]);
    }

    #[test]
    fn prune_if_empty_removes_vacated_level() {
        let mut side = BookSide::new(Side::Buy);
        side.entry(100)
            .push_back(Order::new(OrderType::GoodTillCancel, 1, Side::Buy, 100, 1));
        side.get_mut(100).unwrap().pop_front();
        side.prune_if_empty(100);
        assert!(side.is_empty());
    }
}
