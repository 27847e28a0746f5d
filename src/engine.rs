//! The matching engine: book sides, order index, level cache, the crossing
//! loop, order-type admission rules, and the mutex/day-pruner concurrency
//! shell around them. Grounded directly in
//! `examples/original_source/src/Orderbook.cpp`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};
use std::thread::JoinHandle;

use chrono::{Local, NaiveTime};
use tracing::{debug, info, trace};

use crate::book::BookSide;
use crate::errors::RejectReason;
use crate::level::{Level, LevelAction, LevelCache};
use crate::order::Order;
use crate::pruner;
use crate::trade::{Trade, TradeInfo};
use crate::types::{OrderId, OrderType, Price, Quantity, Side};

/// Request to move a resting order to a new side/price/quantity, keeping
/// its original order type but losing time priority.
#[derive(Debug, Clone, Copy)]
pub struct OrderModify {
    pub order_id: OrderId,
    pub side: Side,
    pub price: Price,
    pub quantity: Quantity,
}

/// Per-price aggregate reported by [`Engine::snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LevelInfo {
    pub price: Price,
    pub quantity: Quantity,
    pub order_count: u32,
}

/// Bid levels (descending) and ask levels (ascending).
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BookSnapshot {
    pub bids: Vec<LevelInfo>,
    pub asks: Vec<LevelInfo>,
}

/// Embedding-application-configurable engine behavior. spec.md §6: the day
/// boundary "should be configurable by the embedding application, not
/// hard-coded in the core."
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Local wall-clock time at which GoodForDay orders are pruned.
    pub prune_at: NaiveTime,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            prune_at: NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
        }
    }
}

/// The book state guarded by the engine's single coarse mutex.
struct Inner {
    bids: BookSide,
    asks: BookSide,
    cache: LevelCache,
    index: HashMap<OrderId, Side>,
}

impl Inner {
    fn new() -> Self {
        Self {
            bids: BookSide::new(Side::Buy),
            asks: BookSide::new(Side::Sell),
            cache: LevelCache::default(),
            index: HashMap::new(),
        }
    }

    fn side_book(&mut self, side: Side) -> &mut BookSide {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    fn can_match(&self, side: Side, price: Price) -> bool {
        match side {
            Side::Buy => self.asks.best_price().is_some_and(|best_ask| price >= best_ask),
            Side::Sell => self.bids.best_price().is_some_and(|best_bid| price <= best_bid),
        }
    }

    /// Walks the level cache for the opposite side in price-time priority,
    /// starting at the best opposite level, until either `qty` is covered
    /// (feasible) or a level's price crosses `price` (infeasible).
    fn can_fully_fill(&self, side: Side, price: Price, qty: Quantity) -> bool {
        if !self.can_match(side, price) {
            return false;
        }
        let opposite = match side {
            Side::Buy => &self.asks,
            Side::Sell => &self.bids,
        };
        let mut remaining = qty;
        for (level_price, _level) in opposite.iter_priority_order() {
            let crosses_limit = match side {
                Side::Buy => level_price > price,
                Side::Sell => level_price < price,
            };
            if crosses_limit {
                break;
            }
            let available = self.cache.get(level_price).quantity;
            if remaining <= available {
                return true;
            }
            remaining -= available;
        }
        false
    }

    fn cancel_orders_locked(&mut self, order_ids: &[OrderId]) {
        for id in order_ids {
            self.remove_order(*id);
        }
    }

    /// Removes a live order from its level and index, updating the cache by
    /// `Remove`. Idempotent no-op if the id is unknown.
    fn remove_order(&mut self, order_id: OrderId) {
        let Some(side) = self.index.get(&order_id).copied() else {
            return;
        };
        let book = self.side_book(side);
        let candidate_prices: Vec<Price> = book.prices().collect();
        let mut found_price = None;
        for price in candidate_prices {
            if book.get(price).is_some_and(|level| level.contains(order_id)) {
                found_price = Some(price);
                break;
            }
        }
        let Some(price) = found_price else {
            self.index.remove(&order_id);
            return;
        };
        let removed_qty = {
            let level = book.get_mut(price).expect("level located by scan above");
            level.remove(order_id).map(|order| order.remaining_qty())
        };
        book.prune_if_empty(price);
        if let Some(qty) = removed_qty {
            self.cache.update(price, qty, LevelAction::Remove);
        }
        self.index.remove(&order_id);
    }

    /// The price-time priority crossing loop. Emits trades deterministically
    /// and keeps the level cache consistent with every list mutation.
    fn match_orders(&mut self) -> Vec<Trade> {
        let mut trades = Vec::new();
        while let (Some(bid_price), Some(ask_price)) = (self.bids.best_price(), self.asks.best_price()) {
            if bid_price < ask_price {
                break;
            }

            loop {
                let bid_level = self.bids.get_mut(bid_price).expect("bid level vanished mid-match");
                let ask_level = self.asks.get_mut(ask_price).expect("ask level vanished mid-match");
                if bid_level.is_empty() || ask_level.is_empty() {
                    break;
                }

                let (trade, bid_filled, ask_filled) = {
                    let bid = bid_level.front_mut().expect("checked non-empty above");
                    let ask = ask_level.front_mut().expect("checked non-empty above");
                    fill_pair(bid, ask)
                };

                if bid_filled {
                    let order = bid_level.pop_front().expect("front just observed filled");
                    self.index.remove(&order.id());
                }
                if ask_filled {
                    let order = ask_level.pop_front().expect("front just observed filled");
                    self.index.remove(&order.id());
                }

                trace!(?trade, "matched");
                self.cache.update(
                    trade.bid.price,
                    trade.bid.quantity,
                    if bid_filled { LevelAction::Remove } else { LevelAction::Match },
                );
                self.cache.update(
                    trade.ask.price,
                    trade.ask.quantity,
                    if ask_filled { LevelAction::Remove } else { LevelAction::Match },
                );
                trades.push(trade);

                if bid_filled || ask_filled {
                    break;
                }
            }

            self.bids.prune_if_empty(bid_price);
            self.asks.prune_if_empty(ask_price);
        }

        self.cancel_top_of_book_fill_and_kill(Side::Buy);
        self.cancel_top_of_book_fill_and_kill(Side::Sell);

        trades
    }

    fn cancel_top_of_book_fill_and_kill(&mut self, side: Side) {
        let book = match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        };
        let Some(price) = book.best_price() else { return };
        let survivor = book
            .get(price)
            .and_then(Level::front)
            .filter(|order| order.order_type() == OrderType::FillAndKill && !order.is_filled());
        if let Some(order) = survivor {
            let id = order.id();
            debug!(order_id = id, "evicting fill-and-kill survivor");
            self.remove_order(id);
        }
    }

    fn snapshot(&self) -> BookSnapshot {
        let to_infos = |side: &BookSide| {
            side.iter_priority_order()
                .map(|(price, _level)| {
                    let data = self.cache.get(price);
                    LevelInfo {
                        price,
                        quantity: data.quantity,
                        order_count: data.count,
                    }
                })
                .collect()
        };
        BookSnapshot {
            bids: to_infos(&self.bids),
            asks: to_infos(&self.asks),
        }
    }
}

fn fill_pair(bid: &mut Order, ask: &mut Order) -> (Trade, bool, bool) {
    let qty = bid.remaining_qty().min(ask.remaining_qty());
    bid.fill(qty);
    ask.fill(qty);
    let trade = Trade {
        bid: TradeInfo { order_id: bid.id(), price: bid.price(), quantity: qty },
        ask: TradeInfo { order_id: ask.id(), price: ask.price(), quantity: qty },
    };
    (trade, bid.is_filled(), ask.is_filled())
}

/// State shared between the public `Engine` handle and its day-pruner
/// thread: the coarse mutex, its paired condvar, and the shutdown flag.
struct Shared {
    state: Mutex<Inner>,
    shutdown_cv: Condvar,
    shutdown: AtomicBool,
}

/// A single-instrument limit-order book and price-time priority matching
/// engine. Every public method acquires the engine's mutex at entry.
pub struct Engine {
    shared: std::sync::Arc<Shared>,
    pruner: Option<JoinHandle<()>>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let shared = std::sync::Arc::new(Shared {
            state: Mutex::new(Inner::new()),
            shutdown_cv: Condvar::new(),
            shutdown: AtomicBool::new(false),
        });
        let pruner_shared = std::sync::Arc::clone(&shared);
        let pruner = std::thread::Builder::new()
            .name("day-pruner".into())
            .spawn(move || run_pruner(pruner_shared, config.prune_at))
            .expect("failed to spawn day-pruner thread");
        info!(prune_at = %config.prune_at, "engine started");
        Self { shared, pruner: Some(pruner) }
    }

    /// Admits `order`, applying Market-rewrite and FillAndKill/FillOrKill
    /// admission rules, then runs the matching loop. Returns the trades
    /// produced. Silently rejects (empty result) on a duplicate id or a
    /// failed admission test.
    pub fn add_order(&self, mut order: Order) -> Vec<Trade> {
        let mut inner = self.shared.state.lock().unwrap();

        if inner.index.contains_key(&order.id()) {
            debug!(reason = %RejectReason::DuplicateOrderId(order.id()));
            return Vec::new();
        }

        if order.order_type() == OrderType::Market {
            let opposite_worst = match order.side() {
                Side::Buy => inner.asks.worst_price(),
                Side::Sell => inner.bids.worst_price(),
            };
            match opposite_worst {
                Some(price) => order.to_good_till_cancel(price),
                None => {
                    debug!(reason = %RejectReason::MarketNoLiquidity(order.id()));
                    return Vec::new();
                }
            }
        }

        if order.order_type() == OrderType::FillAndKill && !inner.can_match(order.side(), order.price())
        {
            debug!(reason = %RejectReason::FillAndKillNoMatch(order.id()));
            return Vec::new();
        }

        if order.order_type() == OrderType::FillOrKill
            && !inner.can_fully_fill(order.side(), order.price(), order.initial_qty())
        {
            debug!(reason = %RejectReason::FillOrKillInfeasible(order.id()));
            return Vec::new();
        }

        let id = order.id();
        let side = order.side();
        let price = order.price();
        let qty = order.initial_qty();

        inner.side_book(side).entry(price).push_back(order);
        inner.index.insert(id, side);
        inner.cache.update(price, qty, LevelAction::Add);

        let trades = inner.match_orders();
        info!(order_id = id, trades = trades.len(), "order admitted");
        trades
    }

    /// Idempotent no-op if `order_id` is unknown.
    pub fn cancel_order(&self, order_id: OrderId) {
        let mut inner = self.shared.state.lock().unwrap();
        inner.remove_order(order_id);
    }

    /// Cancels the existing order (if any) and re-admits it with the
    /// modification's side/price/quantity, preserving its order type. The
    /// re-admitted order loses time priority. Two separate lock
    /// acquisitions, per spec.md §5 / §9 Open Question (a): a concurrent
    /// mutation between the type read and the cancel is accepted as a
    /// best-effort race, not widened into one critical section.
    pub fn modify_order(&self, modification: OrderModify) -> Vec<Trade> {
        let order_type = {
            let inner = self.shared.state.lock().unwrap();
            let Some(&side) = inner.index.get(&modification.order_id) else {
                return Vec::new();
            };
            let book = match side {
                Side::Buy => &inner.bids,
                Side::Sell => &inner.asks,
            };
            let Some(existing) = book.find(modification.order_id) else {
                return Vec::new();
            };
            existing.order_type()
        };

        self.cancel_order(modification.order_id);
        let replacement = Order::new(
            order_type,
            modification.order_id,
            modification.side,
            modification.price,
            modification.quantity,
        );
        self.add_order(replacement)
    }

    /// Per-price aggregates for both sides: bids descending, asks ascending.
    pub fn snapshot(&self) -> BookSnapshot {
        self.shared.state.lock().unwrap().snapshot()
    }

    /// Number of live orders.
    pub fn size(&self) -> usize {
        self.shared.state.lock().unwrap().index.len()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::Release);
        self.shared.shutdown_cv.notify_one();
        if let Some(handle) = self.pruner.take() {
            let _ = handle.join();
        }
    }
}

/// The day-pruner's loop body (spec.md §4.5): compute next prune time,
/// sleep on a shutdown-aware condvar, then collect-and-cancel GoodForDay
/// orders in two phases to bound the critical section.
fn run_pruner(shared: std::sync::Arc<Shared>, prune_at: NaiveTime) {
    loop {
        let till = pruner::time_until_next_prune(Local::now(), prune_at);

        let guard = shared.state.lock().unwrap();
        if shared.shutdown.load(Ordering::Acquire) {
            return;
        }
        let (_guard, timeout) = shared
            .shutdown_cv
            .wait_timeout(guard, till)
            .unwrap_or_else(|poisoned| {
                let (guard, result) = poisoned.into_inner();
                (guard, result)
            });
        if shared.shutdown.load(Ordering::Acquire) {
            return;
        }
        if !timeout.timed_out() {
            // Woken early by something other than shutdown (spurious
            // wakeup); loop around and recompute the sleep.
            continue;
        }
        drop(_guard);

        let good_for_day_ids: Vec<OrderId> = {
            let inner = shared.state.lock().unwrap();
            inner
                .index
                .iter()
                .filter_map(|(&id, &side)| {
                    let book = match side {
                        Side::Buy => &inner.bids,
                        Side::Sell => &inner.asks,
                    };
                    book.find(id)
                        .filter(|order| order.order_type() == OrderType::GoodForDay)
                        .map(|_| id)
                })
                .collect()
        };

        info!(count = good_for_day_ids.len(), "pruning good-for-day orders");
        let mut inner = shared.state.lock().unwrap();
        inner.cancel_orders_locked(&good_for_day_ids);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gtc(id: OrderId, side: Side, price: Price, qty: Quantity) -> Order {
        Order::new(OrderType::GoodTillCancel, id, side, price, qty)
    }

    // S1: add then cancel leaves an empty book.
    #[test]
    fn s1_cancel_success() {
        let engine = Engine::new(EngineConfig::default());
        engine.add_order(gtc(1, Side::Buy, 100, 10));
        engine.cancel_order(1);
        assert_eq!(engine.size(), 0);
        let snap = engine.snapshot();
        assert!(snap.bids.is_empty() && snap.asks.is_empty());
    }

    // S2: two non-crossing orders rest on their own levels untouched.
    #[test]
    fn s2_no_match() {
        let engine = Engine::new(EngineConfig::default());
        engine.add_order(gtc(1, Side::Buy, 99, 10));
        engine.add_order(gtc(2, Side::Sell, 101, 10));
        assert_eq!(engine.size(), 2);
        let snap = engine.snapshot();
        assert_eq!(snap.bids.len(), 1);
        assert_eq!(snap.asks.len(), 1);
    }

    // S3: a fully crossing pair matches in full and vacates the book.
    #[test]
    fn s3_full_match() {
        let engine = Engine::new(EngineConfig::default());
        engine.add_order(gtc(1, Side::Buy, 100, 10));
        let trades = engine.add_order(gtc(2, Side::Sell, 100, 10));
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].bid, TradeInfo { order_id: 1, price: 100, quantity: 10 });
        assert_eq!(trades[0].ask, TradeInfo { order_id: 2, price: 100, quantity: 10 });
        assert_eq!(engine.size(), 0);
    }

    // S4: a fill-and-kill that partially matches is evicted, not rested.
    #[test]
    fn s4_fill_and_kill_partial() {
        let engine = Engine::new(EngineConfig::default());
        engine.add_order(gtc(1, Side::Sell, 100, 5));
        let order = Order::new(OrderType::FillAndKill, 2, Side::Buy, 100, 10);
        let trades = engine.add_order(order);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].bid.quantity, 5);
        // the fill-and-kill buy order must not survive on the book
        assert_eq!(engine.size(), 0);
    }

    // S5: a fill-or-kill that cannot be fully filled is rejected outright.
    #[test]
    fn s5_fill_or_kill_miss() {
        let engine = Engine::new(EngineConfig::default());
        engine.add_order(gtc(1, Side::Sell, 100, 5));
        let order = Order::new(OrderType::FillOrKill, 2, Side::Buy, 100, 10);
        let trades = engine.add_order(order);
        assert!(trades.is_empty());
        // the resting sell order is untouched, the FOK buy was never admitted
        assert_eq!(engine.size(), 1);
    }

    // S6: a fill-or-kill that can be filled by spanning multiple levels hits.
    #[test]
    fn s6_fill_or_kill_hit_spanning_levels() {
        let engine = Engine::new(EngineConfig::default());
        engine.add_order(gtc(1, Side::Sell, 100, 5));
        engine.add_order(gtc(2, Side::Sell, 101, 5));
        let order = Order::new(OrderType::FillOrKill, 3, Side::Buy, 101, 10);
        let trades = engine.add_order(order);
        assert_eq!(trades.len(), 2);
        let total_filled: Quantity = trades.iter().map(|t| t.ask.quantity).sum();
        assert_eq!(total_filled, 10);
        assert_eq!(engine.size(), 0);
    }

    // S7: modifying a resting order re-admits it at the back of its new level.
    #[test]
    fn s7_modify_loses_priority() {
        let engine = Engine::new(EngineConfig::default());
        engine.add_order(gtc(1, Side::Buy, 99, 5));
        engine.add_order(gtc(2, Side::Buy, 99, 5));
        engine.modify_order(OrderModify { order_id: 1, side: Side::Buy, price: 99, quantity: 5 });

        // order 1 now sits behind order 2 at the same level: a crossing sell
        // for 5 should match order 2 first, not order 1.
        let trades = engine.add_order(gtc(3, Side::Sell, 99, 5));
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].bid.order_id, 2);
        assert_eq!(engine.size(), 1);
    }

    #[test]
    fn remaining_quantity_never_exceeds_initial_and_never_goes_negative() {
        let engine = Engine::new(EngineConfig::default());
        engine.add_order(gtc(1, Side::Sell, 100, 3));
        let trades = engine.add_order(gtc(2, Side::Buy, 100, 10));
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].bid.quantity, 3);
        // the unmatched remainder of order 2 (7) should still be resting
        let snap = engine.snapshot();
        assert_eq!(snap.bids.len(), 1);
        assert_eq!(snap.bids[0].quantity, 7);
    }

    #[test]
    fn level_cache_tracks_book_contents_through_partial_fills() {
        let engine = Engine::new(EngineConfig::default());
        engine.add_order(gtc(1, Side::Sell, 100, 20));
        engine.add_order(gtc(2, Side::Buy, 100, 8));
        let snap = engine.snapshot();
        assert_eq!(snap.asks.len(), 1);
        assert_eq!(snap.asks[0].quantity, 12);
        assert_eq!(snap.asks[0].order_count, 1);
    }

    #[test]
    fn no_trade_emitted_while_one_side_is_empty() {
        let engine = Engine::new(EngineConfig::default());
        let trades = engine.add_order(gtc(1, Side::Buy, 100, 10));
        assert!(trades.is_empty());
        assert_eq!(engine.size(), 1);
    }

    #[test]
    fn cancel_is_idempotent_for_unknown_and_already_cancelled_ids() {
        let engine = Engine::new(EngineConfig::default());
        engine.cancel_order(999);
        engine.add_order(gtc(1, Side::Buy, 100, 10));
        engine.cancel_order(1);
        engine.cancel_order(1);
        assert_eq!(engine.size(), 0);
    }

    #[test]
    fn duplicate_order_id_is_rejected() {
        let engine = Engine::new(EngineConfig::default());
        engine.add_order(gtc(1, Side::Buy, 100, 10));
        let trades = engine.add_order(gtc(1, Side::Buy, 101, 5));
        assert!(trades.is_empty());
        assert_eq!(engine.size(), 1);
        assert_eq!(engine.snapshot().bids[0].price, 100);
    }

    #[test]
    fn market_order_rewrites_to_worst_opposite_price_and_sweeps() {
        let engine = Engine::new(EngineConfig::default());
        engine.add_order(gtc(1, Side::Sell, 100, 5));
        engine.add_order(gtc(2, Side::Sell, 105, 5));
        let market_buy = Order::market(3, Side::Buy, 10);
        let trades = engine.add_order(market_buy);
        assert_eq!(trades.len(), 2);
        assert_eq!(engine.size(), 0);
    }

    #[test]
    fn market_order_with_no_opposite_liquidity_is_rejected() {
        let engine = Engine::new(EngineConfig::default());
        let trades = engine.add_order(Order::market(1, Side::Buy, 10));
        assert!(trades.is_empty());
        assert_eq!(engine.size(), 0);
    }

    #[test]
    fn add_then_cancel_restores_prior_size() {
        let engine = Engine::new(EngineConfig::default());
        let before = engine.size();
        engine.add_order(gtc(1, Side::Buy, 100, 10));
        engine.cancel_order(1);
        assert_eq!(engine.size(), before);
    }
}
