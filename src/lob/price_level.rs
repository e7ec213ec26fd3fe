//! Price levels with cached aggregates, and the two-sided ledger holding them.
//!
//! A level stores only aggregates (total size, order count, display text);
//! the per-order detail lives in the [`OrderRegistry`](super::OrderRegistry).
//! Both book sides use the same [`LevelTree`], parameterised by a
//! [`SideOrder`] that fixes the iteration direction.
//!
//! # Invariant
//!
//! A level is present iff its `aggregate_size > 0`. Every mutation that can
//! bring the size to zero erases the level in the same call.
//!
//! # Performance
//!
//! | Operation | Complexity |
//! |-----------|------------|
//! | `add_quantity` | O(log L) |
//! | `remove_quantity` | O(log L) |
//! | `top(side, n)` | O(log L + n) |
//! | `best` | O(log L) |

use std::cmp::Reverse;
use std::collections::btree_map::{self, BTreeMap};
use std::iter::Take;
use std::marker::PhantomData;

use crate::types::Side;

/// Aggregate state for one price on one side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceLevel {
    aggregate_size: u64,
    order_count: u32,
    /// First-seen price text at this level
    display_price: String,
}

impl PriceLevel {
    fn new(display_price: &str) -> Self {
        Self {
            aggregate_size: 0,
            order_count: 0,
            display_price: display_price.to_string(),
        }
    }

    /// Total resting size at this price (O(1)).
    #[inline]
    pub fn aggregate_size(&self) -> u64 {
        self.aggregate_size
    }

    /// Number of live orders at this price.
    #[inline]
    pub fn order_count(&self) -> u32 {
        self.order_count
    }

    #[inline]
    pub fn display_price(&self) -> &str {
        &self.display_price
    }
}

/// Iteration direction of one side of the book.
pub trait SideOrder {
    /// Map key whose natural `Ord` is the side's best-first order.
    type Key: Ord + Copy + std::fmt::Debug;

    fn to_key(price_key: i64) -> Self::Key;
    fn from_key(key: Self::Key) -> i64;
}

/// Lowest price first (ask side).
#[derive(Debug, Clone, Copy, Default)]
pub struct Ascending;

/// Highest price first (bid side).
#[derive(Debug, Clone, Copy, Default)]
pub struct Descending;

impl SideOrder for Ascending {
    type Key = i64;

    #[inline(always)]
    fn to_key(price_key: i64) -> i64 {
        price_key
    }

    #[inline(always)]
    fn from_key(key: i64) -> i64 {
        key
    }
}

impl SideOrder for Descending {
    type Key = Reverse<i64>;

    #[inline(always)]
    fn to_key(price_key: i64) -> Reverse<i64> {
        Reverse(price_key)
    }

    #[inline(always)]
    fn from_key(key: Reverse<i64>) -> i64 {
        key.0
    }
}

/// Ordered price → level map for one side.
#[derive(Debug, Clone)]
pub struct LevelTree<O: SideOrder> {
    levels: BTreeMap<O::Key, PriceLevel>,
    _order: PhantomData<O>,
}

impl<O: SideOrder> Default for LevelTree<O> {
    fn default() -> Self {
        Self {
            levels: BTreeMap::new(),
            _order: PhantomData,
        }
    }
}

impl<O: SideOrder> LevelTree<O> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one order's worth of `size` at `price_key`.
    ///
    /// A new level takes `display_price` as its canonical text; an existing
    /// level keeps the text it was created with.
    pub fn add_quantity(&mut self, price_key: i64, display_price: &str, size: u64) {
        let level = self
            .levels
            .entry(O::to_key(price_key))
            .or_insert_with(|| PriceLevel::new(display_price));
        level.aggregate_size = level.aggregate_size.saturating_add(size);
        level.order_count = level.order_count.saturating_add(1);
    }

    /// Remove `size` from the level at `price_key`.
    ///
    /// The order count drops only when `full_removal` is set. The level is
    /// erased once its size reaches zero. Returns `false` if no level exists.
    pub fn remove_quantity(&mut self, price_key: i64, size: u64, full_removal: bool) -> bool {
        let key = O::to_key(price_key);
        let Some(level) = self.levels.get_mut(&key) else {
            return false;
        };

        level.aggregate_size = level.aggregate_size.saturating_sub(size);
        if full_removal {
            level.order_count = level.order_count.saturating_sub(1);
        }
        if level.aggregate_size == 0 {
            self.levels.remove(&key);
        }
        true
    }

    #[inline]
    pub fn get(&self, price_key: i64) -> Option<&PriceLevel> {
        self.levels.get(&O::to_key(price_key))
    }

    /// Best price on this side.
    #[inline]
    pub fn best(&self) -> Option<i64> {
        self.levels.keys().next().map(|&k| O::from_key(k))
    }

    /// Levels in best-first order.
    #[inline]
    pub fn iter(&self) -> LevelIter<'_, O> {
        LevelIter {
            inner: self.levels.iter(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn clear(&mut self) {
        self.levels.clear();
    }
}

/// Best-first iterator over `(price_key, level)`.
#[derive(Debug, Clone)]
pub struct LevelIter<'a, O: SideOrder> {
    inner: btree_map::Iter<'a, O::Key, PriceLevel>,
}

impl<'a, O: SideOrder> Iterator for LevelIter<'a, O> {
    type Item = (i64, &'a PriceLevel);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(&k, level)| (O::from_key(k), level))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Up to `n` levels of one side, returned by [`PriceLevelLedger::top`].
#[derive(Debug, Clone)]
pub enum TopLevels<'a> {
    Bids(Take<LevelIter<'a, Descending>>),
    Asks(Take<LevelIter<'a, Ascending>>),
}

impl<'a> Iterator for TopLevels<'a> {
    type Item = (i64, &'a PriceLevel);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        match self {
            TopLevels::Bids(it) => it.next(),
            TopLevels::Asks(it) => it.next(),
        }
    }
}

/// Both sides of the aggregated book.
///
/// Every non-bid side, [`Side::None`] included, addresses the ask tree.
#[derive(Debug, Clone, Default)]
pub struct PriceLevelLedger {
    bids: LevelTree<Descending>,
    asks: LevelTree<Ascending>,
}

impl PriceLevelLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// See [`LevelTree::add_quantity`].
    #[inline]
    pub fn add_quantity(&mut self, side: Side, price_key: i64, display_price: &str, size: u64) {
        if side.is_bid() {
            self.bids.add_quantity(price_key, display_price, size);
        } else {
            self.asks.add_quantity(price_key, display_price, size);
        }
    }

    /// See [`LevelTree::remove_quantity`].
    #[inline]
    pub fn remove_quantity(
        &mut self,
        side: Side,
        price_key: i64,
        size: u64,
        full_removal: bool,
    ) -> bool {
        if side.is_bid() {
            self.bids.remove_quantity(price_key, size, full_removal)
        } else {
            self.asks.remove_quantity(price_key, size, full_removal)
        }
    }

    /// Up to `n` levels of `side`, best first. Fewer levels is not an error.
    #[inline]
    pub fn top(&self, side: Side, n: usize) -> TopLevels<'_> {
        if side.is_bid() {
            TopLevels::Bids(self.bids.iter().take(n))
        } else {
            TopLevels::Asks(self.asks.iter().take(n))
        }
    }

    pub fn level(&self, side: Side, price_key: i64) -> Option<&PriceLevel> {
        if side.is_bid() {
            self.bids.get(price_key)
        } else {
            self.asks.get(price_key)
        }
    }

    /// Top-of-book price key for `side`.
    pub fn best(&self, side: Side) -> Option<i64> {
        if side.is_bid() {
            self.bids.best()
        } else {
            self.asks.best()
        }
    }

    /// Number of distinct price levels on `side`.
    pub fn depth(&self, side: Side) -> usize {
        if side.is_bid() {
            self.bids.len()
        } else {
            self.asks.len()
        }
    }

    pub fn bids(&self) -> &LevelTree<Descending> {
        &self.bids
    }

    pub fn asks(&self) -> &LevelTree<Ascending> {
        &self.asks
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ledger_is_empty() {
        let ledger = PriceLevelLedger::new();
        assert!(ledger.is_empty());
        assert_eq!(ledger.top(Side::Bid, 10).count(), 0);
        assert_eq!(ledger.best(Side::Ask), None);
    }

    #[test]
    fn test_add_quantity_aggregates() {
        let mut ledger = PriceLevelLedger::new();
        ledger.add_quantity(Side::Bid, 5_510_000, "5.51", 100);
        ledger.add_quantity(Side::Bid, 5_510_000, "5.51", 50);

        let level = ledger.level(Side::Bid, 5_510_000).unwrap();
        assert_eq!(level.aggregate_size(), 150);
        assert_eq!(level.order_count(), 2);
    }

    #[test]
    fn test_first_seen_display_price_wins() {
        let mut ledger = PriceLevelLedger::new();
        ledger.add_quantity(Side::Ask, 5_510_000, "5.51", 10);
        ledger.add_quantity(Side::Ask, 5_510_000, "5.510", 10);
        assert_eq!(ledger.level(Side::Ask, 5_510_000).unwrap().display_price(), "5.51");
    }

    #[test]
    fn test_partial_removal_keeps_count() {
        let mut ledger = PriceLevelLedger::new();
        ledger.add_quantity(Side::Bid, 100, "0.0001", 100);
        assert!(ledger.remove_quantity(Side::Bid, 100, 30, false));

        let level = ledger.level(Side::Bid, 100).unwrap();
        assert_eq!(level.aggregate_size(), 70);
        assert_eq!(level.order_count(), 1);
    }

    #[test]
    fn test_full_removal_erases_empty_level() {
        let mut ledger = PriceLevelLedger::new();
        ledger.add_quantity(Side::Ask, 100, "0.0001", 100);
        ledger.remove_quantity(Side::Ask, 100, 100, true);
        assert!(ledger.level(Side::Ask, 100).is_none());
        assert_eq!(ledger.depth(Side::Ask), 0);
    }

    #[test]
    fn test_removal_saturates_at_zero() {
        let mut ledger = PriceLevelLedger::new();
        ledger.add_quantity(Side::Bid, 100, "0.0001", 10);
        ledger.remove_quantity(Side::Bid, 100, 500, true);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_remove_from_missing_level() {
        let mut ledger = PriceLevelLedger::new();
        assert!(!ledger.remove_quantity(Side::Bid, 100, 10, true));
        assert!(!ledger.remove_quantity(Side::None, 100, 10, true));
    }

    #[test]
    fn test_side_none_uses_ask_tree() {
        let mut ledger = PriceLevelLedger::new();
        ledger.add_quantity(Side::None, 100, "0.0001", 10);
        assert_eq!(ledger.depth(Side::Ask), 1);
        assert_eq!(ledger.depth(Side::Bid), 0);
        assert_eq!(ledger.level(Side::Ask, 100).map(PriceLevel::aggregate_size), Some(10));

        assert!(ledger.remove_quantity(Side::None, 100, 10, true));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_bids_descend_asks_ascend() {
        let mut ledger = PriceLevelLedger::new();
        for (key, text) in [(5_500_000, "5.50"), (5_520_000, "5.52"), (5_510_000, "5.51")] {
            ledger.add_quantity(Side::Bid, key, text, 1);
            ledger.add_quantity(Side::Ask, key, text, 1);
        }

        let bids: Vec<i64> = ledger.top(Side::Bid, 10).map(|(k, _)| k).collect();
        let asks: Vec<i64> = ledger.top(Side::Ask, 10).map(|(k, _)| k).collect();
        assert_eq!(bids, vec![5_520_000, 5_510_000, 5_500_000]);
        assert_eq!(asks, vec![5_500_000, 5_510_000, 5_520_000]);
        assert_eq!(ledger.best(Side::Bid), Some(5_520_000));
        assert_eq!(ledger.best(Side::Ask), Some(5_500_000));
    }

    #[test]
    fn test_top_truncates() {
        let mut ledger = PriceLevelLedger::new();
        for i in 0..25 {
            ledger.add_quantity(Side::Ask, 1_000 + i, "x", 1);
        }
        let top: Vec<i64> = ledger.top(Side::Ask, 10).map(|(k, _)| k).collect();
        assert_eq!(top.len(), 10);
        assert_eq!(top[0], 1_000);
        assert_eq!(top[9], 1_009);
    }

    #[test]
    fn test_clear() {
        let mut ledger = PriceLevelLedger::new();
        ledger.add_quantity(Side::Bid, 1, "a", 1);
        ledger.add_quantity(Side::Ask, 2, "b", 1);
        ledger.clear();
        assert!(ledger.is_empty());
    }
}
