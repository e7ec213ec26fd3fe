//! # MBO-MBP-Reconstructor
//!
//! Rebuilds market-by-price depth (top 10 levels per side, "MBP-10") from
//! market-by-order (MBO) event feeds.
//!
//! Order-level events (add, cancel, modify, clear) are applied one at a time
//! to an in-memory limit order book; after every event the top 10 bid and ask
//! levels are emitted with their aggregate size and order count.
//!
//! ## Features
//!
//! - **Exact price ordering**: prices are keyed as integers scaled by 1e6,
//!   while the input text is kept for output
//! - **O(1) level aggregates**: each level caches total size and order count
//! - **Fixed-shape snapshots**: always 10 bid + 10 ask slots, padded
//! - **Deterministic**: single-threaded, strictly in arrival order
//! - **Compressed input**: `.zst` files are decoded on the fly
//!
//! ## Quick Start
//!
//! ```rust
//! use mbo_mbp_reconstructor::{BookEngine, BookEvent, Side};
//!
//! let mut book = BookEngine::new();
//!
//! book.apply(&BookEvent::add(1, Side::Bid, "5.51", 100));
//! book.apply(&BookEvent::add(2, Side::Bid, "5.51", 50));
//! let snapshot = book.process(&BookEvent::cancel(1, 100));
//!
//! assert_eq!(snapshot.bids[0].price, "5.51");
//! assert_eq!(snapshot.bids[0].size, 50);
//! assert_eq!(snapshot.bids[0].count, 1);
//! assert!(snapshot.asks[0].is_empty());
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`types`] | Core types: `BookEvent`, `Order`, `Action`, `Side`, price keys |
//! | [`lob`] | Book state: `OrderRegistry`, `PriceLevelLedger`, `BookEngine` |
//! | [`snapshot`] | `SnapshotSerializer` and the fixed-shape `DepthSnapshot` |
//! | [`source`] | MBO CSV input: column mapping and row decoding |
//! | [`writer`] | MBP-10 CSV output |
//! | [`convert`] | End-to-end conversion driver |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `zstd` | ✅ | Read `.zst`-compressed input |

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod convert;
pub mod error;
pub mod lob;
pub mod snapshot;
pub mod source;
pub mod types;
pub mod writer;

// Re-exports - Core types
pub use error::{MbpError, Result};
pub use types::{price_to_key, Action, BookEvent, Order, Side, MBP_DEPTH, PRICE_SCALE};

// Re-exports - Book
pub use lob::{BookEngine, BookStats, DuplicateAddPolicy, EngineConfig, OrderRegistry, PriceLevel, PriceLevelLedger};

// Re-exports - Snapshots
pub use snapshot::{DepthSnapshot, LevelView, SnapshotSerializer};

// Re-exports - Conversion
pub use convert::{ConvertConfig, ConvertSummary, Converter, OUTPUT_FILE_NAME};
