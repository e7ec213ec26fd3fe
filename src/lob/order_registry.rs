//! Resting-order registry keyed by order id.
//!
//! Lookups happen on every Cancel and Modify, so the map uses `ahash`.
//! The registry never validates: duplicate inserts overwrite and removing an
//! absent id is a no-op. Callers decide what a duplicate means.

use ahash::AHashMap;

use crate::types::Order;

/// Set of currently-resting orders.
#[derive(Debug, Clone, Default)]
pub struct OrderRegistry {
    orders: AHashMap<u64, Order>,
}

impl OrderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `order` under `order_id`, returning any entry it replaced.
    #[inline]
    pub fn insert(&mut self, order_id: u64, order: Order) -> Option<Order> {
        self.orders.insert(order_id, order)
    }

    /// Look up an order. `None` means not found.
    #[inline]
    pub fn get(&self, order_id: u64) -> Option<&Order> {
        self.orders.get(&order_id)
    }

    #[inline]
    pub fn get_mut(&mut self, order_id: u64) -> Option<&mut Order> {
        self.orders.get_mut(&order_id)
    }

    #[inline]
    pub fn contains(&self, order_id: u64) -> bool {
        self.orders.contains_key(&order_id)
    }

    /// Delete an order. Absent ids are ignored.
    #[inline]
    pub fn remove(&mut self, order_id: u64) -> Option<Order> {
        self.orders.remove(&order_id)
    }

    pub fn clear(&mut self) {
        self.orders.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Iterate over all resting orders (unordered).
    pub fn iter(&self) -> impl Iterator<Item = (u64, &Order)> {
        self.orders.iter().map(|(&id, order)| (id, order))
    }
}
