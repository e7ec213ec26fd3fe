//! Core data types for MBO events and resting orders.
//!
//! Prices travel in two forms: the verbatim text from the feed (kept for
//! output fidelity) and an integer key scaled by [`PRICE_SCALE`] used for
//! ordering and equality.

use serde::{Deserialize, Serialize};

/// Number of price levels per side in an MBP snapshot.
pub const MBP_DEPTH: usize = 10;

/// Scale applied to decimal prices to obtain the integer price key (micro units).
pub const PRICE_SCALE: f64 = 1_000_000.0;

/// MBO action type (what happened to the book)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Add new order to book
    Add,
    /// Cancel (partially or fully) a resting order
    Cancel,
    /// Replace a resting order (delete then insert)
    Modify,
    /// Clear the whole book
    Clear,
    /// Anything else (trade, fill, none): no book change
    Other,
}

impl Action {
    /// Parse action from a byte (Databento format).
    ///
    /// `T`, `F`, `N` and unknown bytes map to [`Action::Other`].
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            b'A' => Action::Add,
            b'C' => Action::Cancel,
            b'M' => Action::Modify,
            b'R' => Action::Clear,
            _ => Action::Other,
        }
    }

    /// Parse action from the first character of a feed field.
    ///
    /// An empty field is [`Action::Other`].
    pub fn from_field(field: &str) -> Self {
        field
            .as_bytes()
            .first()
            .map_or(Action::Other, |&b| Action::from_byte(b))
    }

    /// Whether this action can change the book.
    #[inline]
    pub fn mutates_book(self) -> bool {
        !matches!(self, Action::Other)
    }
}

/// Order side (bid or ask)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Side {
    /// Buy order (bid)
    Bid = b'B',
    /// Sell order (ask)
    Ask = b'A',
    /// Non-directional
    None = b'N',
}

impl Side {
    /// Parse side from a byte. Unknown bytes map to [`Side::None`].
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            b'B' => Side::Bid,
            b'A' => Side::Ask,
            _ => Side::None,
        }
    }

    /// Parse side from the first character of a feed field.
    pub fn from_field(field: &str) -> Self {
        field
            .as_bytes()
            .first()
            .map_or(Side::None, |&b| Side::from_byte(b))
    }

    /// Convert to byte representation.
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Check if this is a bid.
    #[inline(always)]
    pub fn is_bid(self) -> bool {
        matches!(self, Side::Bid)
    }

    /// Check if this is an ask.
    #[inline(always)]
    pub fn is_ask(self) -> bool {
        matches!(self, Side::Ask)
    }

    /// The book side an order with this side rests on.
    ///
    /// Anything that is not a bid rests with the asks, [`Side::None`] included.
    #[inline(always)]
    pub fn book_side(self) -> Side {
        if self.is_bid() {
            Side::Bid
        } else {
            Side::Ask
        }
    }
}

/// Convert a decimal price text to its integer key.
///
/// `"5.51"` becomes `5_510_000`. The value is rounded to the nearest integer
/// after scaling. Empty, unparseable, or non-finite text resolves to key `0`,
/// so all bad prices share one level.
pub fn price_to_key(text: &str) -> i64 {
    let text = text.trim();
    if text.is_empty() {
        return 0;
    }
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => (value * PRICE_SCALE).round() as i64,
        _ => 0,
    }
}

/// Parse an order id field. Empty or unparseable text is `0`.
///
/// The whole trimmed field must be an unsigned integer: no numeric prefix is
/// taken from text like `"12abc"`, and negative ids such as `"-5"` become `0`,
/// so they share id `0` with every other unparseable id.
pub fn parse_order_id(text: &str) -> u64 {
    text.trim().parse().unwrap_or(0)
}

/// Parse a size field. Empty or unparseable text is `0`.
///
/// The whole trimmed field must be an integer, so decimal text such as
/// `"100.0"` is `0` rather than `100`. Negative values are kept; the engine
/// treats non-positive sizes as no-ops.
pub fn parse_size(text: &str) -> i64 {
    text.trim().parse().unwrap_or(0)
}

/// A resting order, as held by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub side: Side,
    pub price_key: i64,
    /// Price exactly as it appeared on the Add that created the order
    pub display_price: String,
    /// Always > 0 while the order is in the registry
    pub remaining_size: u64,
}

/// One decoded book event.
///
/// Borrows the price text from the input row; the registry and ledger copy
/// it only when an order or level is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookEvent<'a> {
    pub action: Action,
    pub side: Side,
    pub order_id: u64,
    pub price_key: i64,
    pub display_price: &'a str,
    /// Order size for Add/Modify, requested reduction for Cancel
    pub size: i64,
}

impl<'a> BookEvent<'a> {
    /// Create an event, deriving the price key from `display_price`.
    pub fn new(action: Action, side: Side, order_id: u64, display_price: &'a str, size: i64) -> Self {
        Self {
            action,
            side,
            order_id,
            price_key: price_to_key(display_price),
            display_price,
            size,
        }
    }

    /// Decode an event from raw feed fields.
    pub fn from_fields(
        action: &str,
        side: &str,
        order_id: &str,
        price: &'a str,
        size: &str,
    ) -> Self {
        Self::new(
            Action::from_field(action),
            Side::from_field(side),
            parse_order_id(order_id),
            price,
            parse_size(size),
        )
    }

    pub fn add(order_id: u64, side: Side, display_price: &'a str, size: i64) -> Self {
        Self::new(Action::Add, side, order_id, display_price, size)
    }

    pub fn cancel(order_id: u64, size: i64) -> Self {
        Self::new(Action::Cancel, Side::None, order_id, "", size)
    }

    pub fn modify(order_id: u64, side: Side, display_price: &'a str, size: i64) -> Self {
        Self::new(Action::Modify, side, order_id, display_price, size)
    }

    pub fn clear() -> Self {
        Self::new(Action::Clear, Side::None, 0, "", 0)
    }
}
