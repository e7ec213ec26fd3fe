//! Single-book event engine.
//!
//! High-performance implementation using:
//! - BTreeMap-backed level trees, one per side, for sorted price levels
//! - ahash HashMap for fast order lookups
//! - Cached per-level aggregates, so snapshots never walk individual orders
//!
//! Every event is an atomic transition: when `apply` returns, the registry
//! and the ledger agree again.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use super::order_registry::OrderRegistry;
use super::price_level::PriceLevelLedger;
use crate::error::{MbpError, Result};
use crate::snapshot::{DepthSnapshot, SnapshotSerializer};
use crate::types::{Action, BookEvent, Order, Side};

/// What to do when an Add arrives for an order id that is still resting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DuplicateAddPolicy {
    /// Replace the registry entry and add the new size to the ledger (default).
    ///
    /// The old order's quantity stays at its level and is reported by
    /// [`BookEngine::audit`].
    #[default]
    Overwrite,

    /// Fully remove the live order first, as Modify does
    Replace,

    /// Ignore the Add
    Reject,
}

/// Configuration for engine behavior.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How to handle an Add for a live order id
    pub duplicate_add: DuplicateAddPolicy,

    /// Whether to log anomalies (unknown cancels, duplicate adds, crossed books)
    pub log_warnings: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            duplicate_add: DuplicateAddPolicy::Overwrite,
            log_warnings: true,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set duplicate-add handling policy.
    pub fn with_duplicate_add_policy(mut self, policy: DuplicateAddPolicy) -> Self {
        self.duplicate_add = policy;
        self
    }

    /// Enable/disable anomaly logs.
    pub fn with_logging(mut self, log: bool) -> Self {
        self.log_warnings = log;
        self
    }
}

/// Counters for monitoring book health.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookStats {
    /// Total events applied, of any kind
    pub events_applied: u64,
    pub adds: u64,
    pub cancels: u64,
    pub modifies: u64,
    pub clears: u64,

    /// Events with no book effect (trades, fills, unknown actions)
    pub ignored: u64,

    /// Cancels for ids not in the registry
    pub unknown_order_cancels: u64,

    /// Adds for ids already in the registry
    pub duplicate_adds: u64,

    /// Adds (or Modify re-adds) dropped for size <= 0
    pub rejected_adds: u64,

    /// Removals that found no level for a registry order
    pub missing_levels: u64,

    /// Events after which best bid > best ask
    pub crossed_books: u64,

    /// Number of resting orders
    pub active_orders: usize,

    /// Number of price levels (bid side)
    pub bid_levels: usize,

    /// Number of price levels (ask side)
    pub ask_levels: usize,
}

/// Order-level book that maintains price-level aggregates.
///
/// Owns the whole book state: the order registry and the level ledger. There
/// is no shared or global state; one engine is one book.
#[derive(Debug, Clone, Default)]
pub struct BookEngine {
    config: EngineConfig,
    registry: OrderRegistry,
    ledger: PriceLevelLedger,
    stats: BookStats,
}

impl BookEngine {
    /// Create an engine with the default configuration.
    ///
    /// # Example
    /// ```
    /// use mbo_mbp_reconstructor::{BookEngine, BookEvent, Side};
    ///
    /// let mut book = BookEngine::new();
    /// book.apply(&BookEvent::add(1, Side::Bid, "5.51", 100));
    /// assert_eq!(book.best_bid(), Some(5_510_000));
    /// ```
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine with a custom configuration.
    ///
    /// # Example
    /// ```
    /// use mbo_mbp_reconstructor::{BookEngine, DuplicateAddPolicy, EngineConfig};
    ///
    /// let config = EngineConfig::new().with_duplicate_add_policy(DuplicateAddPolicy::Reject);
    /// let book = BookEngine::with_config(config);
    /// ```
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            registry: OrderRegistry::new(),
            ledger: PriceLevelLedger::new(),
            stats: BookStats::default(),
        }
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Apply one event to the book.
    ///
    /// Unknown ids and non-positive sizes are silent no-ops; this never fails.
    /// Orders with a side other than bid rest on the ask side.
    #[inline]
    pub fn apply(&mut self, event: &BookEvent<'_>) {
        match event.action {
            Action::Add => {
                self.stats.adds += 1;
                self.add_order(event);
            }
            Action::Cancel => {
                self.stats.cancels += 1;
                self.cancel_order(event.order_id, event.size);
            }
            Action::Modify => {
                self.stats.modifies += 1;
                self.modify_order(event);
            }
            Action::Clear => {
                self.stats.clears += 1;
                self.clear();
            }
            Action::Other => self.stats.ignored += 1,
        }

        self.stats.events_applied += 1;
        self.stats.active_orders = self.registry.len();
        self.stats.bid_levels = self.ledger.depth(Side::Bid);
        self.stats.ask_levels = self.ledger.depth(Side::Ask);

        if event.action.mutates_book() {
            self.track_crossing();
        }
    }

    /// Apply one event and return the resulting top-10 snapshot.
    #[inline]
    pub fn process(&mut self, event: &BookEvent<'_>) -> DepthSnapshot<'_> {
        self.apply(event);
        self.snapshot()
    }

    /// Current top-10 snapshot.
    #[inline]
    pub fn snapshot(&self) -> DepthSnapshot<'_> {
        SnapshotSerializer::dump(&self.ledger)
    }

    fn add_order(&mut self, event: &BookEvent<'_>) {
        if event.size <= 0 {
            self.stats.rejected_adds += 1;
            return;
        }

        if self.registry.contains(event.order_id) {
            self.stats.duplicate_adds += 1;
            if self.config.log_warnings {
                log::debug!(
                    "Add for live order {} ({:?} policy, event #{})",
                    event.order_id,
                    self.config.duplicate_add,
                    self.stats.events_applied
                );
            }
            match self.config.duplicate_add {
                DuplicateAddPolicy::Overwrite => {}
                DuplicateAddPolicy::Replace => self.remove_order(event.order_id),
                DuplicateAddPolicy::Reject => return,
            }
        }

        let size = event.size as u64;
        let side = event.side.book_side();
        self.registry.insert(
            event.order_id,
            Order {
                side,
                price_key: event.price_key,
                display_price: event.display_price.to_string(),
                remaining_size: size,
            },
        );
        self.ledger
            .add_quantity(side, event.price_key, event.display_price, size);
    }

    /// Reduce an order by up to `requested` units.
    fn cancel_order(&mut self, order_id: u64, requested: i64) {
        if requested <= 0 {
            return;
        }

        let Some(order) = self.registry.get_mut(order_id) else {
            self.stats.unknown_order_cancels += 1;
            if self.config.log_warnings {
                log::debug!("Cancel for unknown order {order_id}");
            }
            return;
        };

        let delta = (requested as u64).min(order.remaining_size);
        let full_removal = delta == order.remaining_size;
        order.remaining_size -= delta;
        let (side, price_key) = (order.side, order.price_key);

        if full_removal {
            self.registry.remove(order_id);
        }
        self.remove_from_level(order_id, side, price_key, delta, full_removal);
    }

    /// Delete-then-insert: the old order is always removed in full, even when
    /// side, price and size are unchanged, so queue priority is not preserved.
    fn modify_order(&mut self, event: &BookEvent<'_>) {
        self.remove_order(event.order_id);
        self.add_order(event);
    }

    /// Remove an order's entire remaining size.
    fn remove_order(&mut self, order_id: u64) {
        if let Some(order) = self.registry.remove(order_id) {
            self.remove_from_level(
                order_id,
                order.side,
                order.price_key,
                order.remaining_size,
                true,
            );
        }
    }

    #[inline(always)]
    fn remove_from_level(
        &mut self,
        order_id: u64,
        side: Side,
        price_key: i64,
        size: u64,
        full_removal: bool,
    ) {
        if !self
            .ledger
            .remove_quantity(side, price_key, size, full_removal)
        {
            self.stats.missing_levels += 1;
            if self.config.log_warnings {
                log::debug!("No {side:?} level {price_key} for order {order_id}");
            }
        }
    }

    fn track_crossing(&mut self) {
        if !self.is_crossed() {
            return;
        }
        self.stats.crossed_books += 1;
        if self.config.log_warnings {
            if let (Some(bid), Some(ask)) = (self.best_bid(), self.best_ask()) {
                log::debug!(
                    "Crossed book: bid={bid} > ask={ask} (event #{})",
                    self.stats.events_applied
                );
            }
        }
    }

    /// Drop every order and level.
    pub fn clear(&mut self) {
        self.registry.clear();
        self.ledger.clear();
    }

    /// Clear the book and the statistics.
    pub fn reset(&mut self) {
        self.clear();
        self.stats = BookStats::default();
    }

    /// Highest bid price key.
    #[inline]
    pub fn best_bid(&self) -> Option<i64> {
        self.ledger.best(Side::Bid)
    }

    /// Lowest ask price key.
    #[inline]
    pub fn best_ask(&self) -> Option<i64> {
        self.ledger.best(Side::Ask)
    }

    /// Check if the book is crossed (bid > ask).
    #[inline]
    pub fn is_crossed(&self) -> bool {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => bid > ask,
            _ => false,
        }
    }

    /// Look up a resting order.
    pub fn order(&self, order_id: u64) -> Result<&Order> {
        self.registry
            .get(order_id)
            .ok_or(MbpError::OrderNotFound(order_id))
    }

    pub fn order_count(&self) -> usize {
        self.registry.len()
    }

    pub fn registry(&self) -> &OrderRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &PriceLevelLedger {
        &self.ledger
    }

    pub fn stats(&self) -> &BookStats {
        &self.stats
    }

    /// Recompute every level from the registry and compare with the ledger.
    ///
    /// O(orders + levels). Reports the first disagreement found.
    pub fn audit(&self) -> Result<()> {
        let mut expected: AHashMap<(Side, i64), (u64, u32)> = AHashMap::new();
        for (order_id, order) in self.registry.iter() {
            if order.remaining_size == 0 {
                return Err(MbpError::InconsistentState(format!(
                    "order {order_id} rests with zero size"
                )));
            }
            let entry = expected.entry((order.side, order.price_key)).or_default();
            entry.0 += order.remaining_size;
            entry.1 += 1;
        }

        let mut seen = 0usize;
        for side in [Side::Bid, Side::Ask] {
            let mut previous: Option<i64> = None;
            for (price_key, level) in self.ledger.top(side, usize::MAX) {
                if let Some(prev) = previous {
                    let ordered = match side {
                        Side::Bid => price_key < prev,
                        _ => price_key > prev,
                    };
                    if !ordered {
                        return Err(MbpError::InconsistentState(format!(
                            "{side:?} level {price_key} out of order after {prev}"
                        )));
                    }
                }
                previous = Some(price_key);

                let (size, count) = expected.get(&(side, price_key)).copied().unwrap_or((0, 0));
                if level.aggregate_size() != size || level.order_count() != count {
                    return Err(MbpError::InconsistentState(format!(
                        "{side:?} level {price_key}: ledger ({}, {}) != orders ({size}, {count})",
                        level.aggregate_size(),
                        level.order_count()
                    )));
                }
                seen += 1;
            }
        }

        if seen != expected.len() {
            return Err(MbpError::InconsistentState(format!(
                "{} resting price(s) have no level",
                expected.len() - seen
            )));
        }
        Ok(())
    }
}
