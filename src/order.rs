//! A mutable record describing one resting or incoming buy/sell intent.

use crate::types::{OrderId, OrderType, Price, Quantity, Side};

#[derive(Debug, Clone)]
pub struct Order {
    id: OrderId,
    side: Side,
    order_type: OrderType,
    price: Price,
    initial_qty: Quantity,
    remaining_qty: Quantity,
}

impl Order {
    /// Builds a limit-priced order (GoodTillCancel, GoodForDay, FillAndKill, FillOrKill).
    pub fn new(order_type: OrderType, id: OrderId, side: Side, price: Price, qty: Quantity) -> Self {
        assert!(qty > 0, "order {id} submitted with zero quantity");
        Self {
            id,
            side,
            order_type,
            price,
            initial_qty: qty,
            remaining_qty: qty,
        }
    }

    /// Builds a pre-admission Market order. It carries no meaningful price
    /// until [`Order::to_good_till_cancel`] rewrites it.
    pub fn market(id: OrderId, side: Side, qty: Quantity) -> Self {
        Self::new(OrderType::Market, id, side, 0, qty)
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    pub fn price(&self) -> Price {
        self.price
    }

    pub fn initial_qty(&self) -> Quantity {
        self.initial_qty
    }

    pub fn remaining_qty(&self) -> Quantity {
        self.remaining_qty
    }

    pub fn filled_qty(&self) -> Quantity {
        self.initial_qty - self.remaining_qty
    }

    pub fn is_filled(&self) -> bool {
        self.remaining_qty == 0
    }

    /// Reduces the remaining quantity by `qty`. A programmer error to call
    /// with more than what remains — fails fast rather than silently
    /// clamping, per spec.md §7 kind 1.
    pub fn fill(&mut self, qty: Quantity) {
        assert!(
            qty <= self.remaining_qty,
            "order {} cannot be filled for more than its remaining quantity {}",
            self.id,
            self.remaining_qty
        );
        self.remaining_qty -= qty;
    }

    /// Rewrites a Market order in place to a GoodTillCancel pinned at
    /// `price` (the worst resting price on the opposite side). Only valid
    /// on a not-yet-admitted Market order.
    pub fn to_good_till_cancel(&mut self, price: Price) {
        assert_eq!(
            self.order_type,
            OrderType::Market,
            "order {} is not a market order, cannot rewrite price and type",
            self.id
        );
        self.price = price;
        self.order_type = OrderType::GoodTillCancel;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_reduces_remaining_and_tracks_filled() {
        let mut o = Order::new(OrderType::GoodTillCancel, 1, Side::Buy, 100, 10);
        o.fill(4);
        assert_eq!(o.remaining_qty(), 6);
        assert_eq!(o.filled_qty(), 4);
        assert!(!o.is_filled());
        o.fill(6);
        assert!(o.is_filled());
    }

    #[test]
    #[should_panic(expected = "cannot be filled for more than its remaining quantity")]
    fn fill_past_remaining_panics() {
        let mut o = Order::new(OrderType::GoodTillCancel, 1, Side::Buy, 100, 10);
        o.fill(11);
    }

    #[test]
    fn market_rewrite_to_good_till_cancel() {
        let mut o = Order::market(1, Side::Buy, 10);
        o.to_good_till_cancel(105);
        assert_eq!(o.order_type(), OrderType::GoodTillCancel);
        assert_eq!(o.price(), 105);
    }

    #[test]
    #[should_panic(expected = "is not a market order")]
    fn rewrite_non_market_order_panics() {
        let mut o = Order::new(OrderType::GoodTillCancel, 1, Side::Buy, 100, 10);
        o.to_good_till_cancel(105);
    }
}
