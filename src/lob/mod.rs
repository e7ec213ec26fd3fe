//! Limit Order Book (LOB) state and event application.
//!
//! [`OrderRegistry`] holds resting orders, [`PriceLevelLedger`] holds the
//! per-price aggregates, and [`BookEngine`] keeps the two consistent.

mod order_registry;
pub mod price_level;
pub mod reconstructor;

pub use order_registry::OrderRegistry;
pub use price_level::{Ascending, Descending, LevelTree, PriceLevel, PriceLevelLedger, SideOrder, TopLevels};
pub use reconstructor::{BookEngine, BookStats, DuplicateAddPolicy, EngineConfig};
