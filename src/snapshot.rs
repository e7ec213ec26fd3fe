//! Fixed-shape MBP-10 snapshots of the ledger.
//!
//! A snapshot always holds exactly [`MBP_DEPTH`] bid slots followed by
//! [`MBP_DEPTH`] ask slots. Missing levels are padded with
//! [`LevelView::EMPTY`], which renders as an empty price with size and count 0.
//! Prices are the stored display text, never re-derived from the integer key.

use crate::lob::PriceLevelLedger;
use crate::types::{Side, MBP_DEPTH};

/// One rendered price level slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelView<'a> {
    pub price: &'a str,
    pub size: u64,
    pub count: u32,
}

impl<'a> LevelView<'a> {
    /// Padding for ranks past the last level.
    pub const EMPTY: LevelView<'static> = LevelView {
        price: "",
        size: 0,
        count: 0,
    };

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0 && self.size == 0 && self.price.is_empty()
    }
}

/// Top-of-book depth for both sides. Borrows the ledger's display prices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepthSnapshot<'a> {
    /// Highest price first
    pub bids: [LevelView<'a>; MBP_DEPTH],
    /// Lowest price first
    pub asks: [LevelView<'a>; MBP_DEPTH],
}

impl<'a> DepthSnapshot<'a> {
    /// All slots empty.
    pub fn empty() -> Self {
        Self {
            bids: [LevelView::EMPTY; MBP_DEPTH],
            asks: [LevelView::EMPTY; MBP_DEPTH],
        }
    }

    /// The 20 slots in output order: bids then asks.
    pub fn slots(&self) -> impl Iterator<Item = &LevelView<'a>> {
        self.bids.iter().chain(self.asks.iter())
    }

    /// Number of non-empty levels on `side`.
    pub fn depth(&self, side: Side) -> usize {
        let slots = if side.is_bid() { &self.bids } else { &self.asks };
        slots.iter().take_while(|slot| !slot.is_empty()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots().all(LevelView::is_empty)
    }
}

impl Default for DepthSnapshot<'_> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Turns the ledger into [`DepthSnapshot`]s.
pub struct SnapshotSerializer;

impl SnapshotSerializer {
    /// Top [`MBP_DEPTH`] levels of each side.
    #[inline]
    pub fn dump(ledger: &PriceLevelLedger) -> DepthSnapshot<'_> {
        let mut snapshot = DepthSnapshot::empty();
        Self::fill(ledger, Side::Bid, &mut snapshot.bids);
        Self::fill(ledger, Side::Ask, &mut snapshot.asks);
        snapshot
    }

    #[inline(always)]
    fn fill<'a>(ledger: &'a PriceLevelLedger, side: Side, slots: &mut [LevelView<'a>; MBP_DEPTH]) {
        for (slot, (_, level)) in slots.iter_mut().zip(ledger.top(side, MBP_DEPTH)) {
            *slot = LevelView {
                price: level.display_price(),
                size: level.aggregate_size(),
                count: level.order_count(),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_ledger_pads_all_slots() {
        let ledger = PriceLevelLedger::new();
        let snapshot = SnapshotSerializer::dump(&ledger);
        assert_eq!(snapshot.slots().count(), 2 * MBP_DEPTH);
        assert!(snapshot.is_empty());
        assert_eq!(snapshot, DepthSnapshot::default());
    }

    #[test]
    fn test_dump_uses_display_text() {
        let mut ledger = PriceLevelLedger::new();
        ledger.add_quantity(Side::Bid, 5_510_000, "5.510000000", 100);
        let snapshot = SnapshotSerializer::dump(&ledger);
        assert_eq!(
            snapshot.bids[0],
            LevelView {
                price: "5.510000000",
                size: 100,
                count: 1
            }
        );
        assert!(snapshot.bids[1].is_empty());
        assert!(snapshot.asks[0].is_empty());
    }

    #[test]
    fn test_dump_caps_at_ten_levels() {
        let mut ledger = PriceLevelLedger::new();
        let prices: Vec<String> = (0..15).map(|i| format!("{}.00", 100 + i)).collect();
        for (i, price) in prices.iter().enumerate() {
            ledger.add_quantity(Side::Bid, (100 + i as i64) * 1_000_000, price, 1);
            ledger.add_quantity(Side::Ask, (100 + i as i64) * 1_000_000, price, 2);
        }

        let snapshot = SnapshotSerializer::dump(&ledger);
        assert_eq!(snapshot.depth(Side::Bid), MBP_DEPTH);
        assert_eq!(snapshot.depth(Side::Ask), MBP_DEPTH);
        assert_eq!(snapshot.bids[0].price, "114.00");
        assert_eq!(snapshot.bids[9].price, "105.00");
        assert_eq!(snapshot.asks[0].price, "100.00");
        assert_eq!(snapshot.asks[9].price, "109.00");
    }

    #[test]
    fn test_partial_depth() {
        let mut ledger = PriceLevelLedger::new();
        ledger.add_quantity(Side::Ask, 1, "a", 5);
        ledger.add_quantity(Side::Ask, 2, "b", 5);
        ledger.add_quantity(Side::Ask, 3, "c", 5);
        let snapshot = SnapshotSerializer::dump(&ledger);
        assert_eq!(snapshot.depth(Side::Ask), 3);
        assert_eq!(snapshot.depth(Side::Bid), 0);
        assert_eq!(snapshot.depth(Side::None), 3);
    }
}
