//! MBO CSV input: opening files, mapping header columns, decoding rows.
//!
//! The feed is Databento-style MBO CSV. Fields are split on `,` with no
//! quote processing, so every field reaches the book exactly as written.
//!
//! # Row acceptance
//!
//! A row is decoded only if it has at least `min_fields` fields *and* every
//! resolved column index falls inside it. Anything else is reported as
//! `None` and the caller skips it without touching the book.
//!
//! # Example
//!
//! ```
//! use csv::StringRecord;
//! use mbo_mbp_reconstructor::source::ColumnMap;
//! use mbo_mbp_reconstructor::{Action, Side};
//!
//! let header = StringRecord::from(vec![
//!     "ts_recv", "ts_event", "action", "side", "price", "size", "order_id",
//! ]);
//! let columns = ColumnMap::from_headers(&header).unwrap();
//!
//! let row = StringRecord::from(vec!["1", "2", "A", "B", "5.51", "100", "7"]);
//! let decoded = columns.decode(&row, 7).unwrap();
//! assert_eq!(decoded.event.action, Action::Add);
//! assert_eq!(decoded.event.side, Side::Bid);
//! ```

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::StringRecord;

use crate::error::{MbpError, Result};
use crate::types::BookEvent;

/// Buffer size for file reads and writes.
pub const IO_BUFFER_SIZE: usize = 1024 * 1024;

/// Rows with fewer fields than this are skipped.
pub const MIN_ROW_FIELDS: usize = 15;

/// Columns that must be present in the input header.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "ts_recv", "ts_event", "action", "side", "price", "size", "order_id",
];

/// Open an input file, transparently decompressing `.zst`.
pub fn open_input(path: impl AsRef<Path>) -> Result<Box<dyn Read>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| MbpError::io(path, e))?;
    let reader = BufReader::with_capacity(IO_BUFFER_SIZE, file);

    if path.extension().is_some_and(|ext| ext == "zst") {
        return open_zstd(path, reader);
    }
    Ok(Box::new(reader))
}

#[cfg(feature = "zstd")]
fn open_zstd(path: &Path, reader: BufReader<File>) -> Result<Box<dyn Read>> {
    log::debug!("Decompressing {} with zstd", path.display());
    let decoder =
        zstd::stream::read::Decoder::with_buffer(reader).map_err(|e| MbpError::io(path, e))?;
    Ok(Box::new(decoder))
}

#[cfg(not(feature = "zstd"))]
fn open_zstd(path: &Path, _reader: BufReader<File>) -> Result<Box<dyn Read>> {
    Err(MbpError::generic(format!(
        "{} is zstd-compressed but the `zstd` feature is disabled",
        path.display()
    )))
}

/// Build a CSV reader configured for raw comma splitting.
pub fn feed_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .buffer_capacity(IO_BUFFER_SIZE)
        .from_reader(reader)
}

/// Positions of the known columns in the input header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub ts_recv: usize,
    pub ts_event: usize,
    pub action: usize,
    pub side: usize,
    pub price: usize,
    pub size: usize,
    pub order_id: usize,

    pub rtype: Option<usize>,
    pub publisher_id: Option<usize>,
    pub instrument_id: Option<usize>,
    pub channel_id: Option<usize>,
    pub flags: Option<usize>,
    pub ts_in_delta: Option<usize>,
    pub sequence: Option<usize>,
    pub symbol: Option<usize>,

    /// Highest resolved index; shorter rows are rejected
    max_index: usize,
}

impl ColumnMap {
    /// Resolve column positions by exact header name.
    ///
    /// # Errors
    /// [`MbpError::MissingColumns`] listing every required column not found.
    pub fn from_headers(headers: &StringRecord) -> Result<Self> {
        let lookup = |name: &str| headers.iter().position(|h| h == name);

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|&&name| lookup(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(MbpError::MissingColumns(missing));
        }
        let required = |name: &str| lookup(name).unwrap_or_default();

        let mut map = Self {
            ts_recv: required("ts_recv"),
            ts_event: required("ts_event"),
            action: required("action"),
            side: required("side"),
            price: required("price"),
            size: required("size"),
            order_id: required("order_id"),
            rtype: lookup("rtype"),
            publisher_id: lookup("publisher_id"),
            instrument_id: lookup("instrument_id"),
            channel_id: lookup("channel_id"),
            flags: lookup("flags"),
            ts_in_delta: lookup("ts_in_delta"),
            sequence: lookup("sequence"),
            symbol: lookup("symbol"),
            max_index: 0,
        };
        map.max_index = map.indices().max().unwrap_or_default();

        log::debug!(
            "Resolved {} input columns (max index {})",
            map.indices().count(),
            map.max_index
        );
        Ok(map)
    }

    fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        [
            self.ts_recv,
            self.ts_event,
            self.action,
            self.side,
            self.price,
            self.size,
            self.order_id,
        ]
        .into_iter()
        .chain(
            [
                self.rtype,
                self.publisher_id,
                self.instrument_id,
                self.channel_id,
                self.flags,
                self.ts_in_delta,
                self.sequence,
                self.symbol,
            ]
            .into_iter()
            .flatten(),
        )
    }

    /// Minimum number of fields a row needs for every column to resolve.
    #[inline]
    pub fn required_len(&self) -> usize {
        self.max_index + 1
    }

    /// Decode one row, or `None` if it is malformed.
    #[inline]
    pub fn decode<'r>(&self, record: &'r StringRecord, min_fields: usize) -> Option<FeedRow<'r>> {
        if record.len() < min_fields || record.len() < self.required_len() {
            return None;
        }

        let field = |i: usize| record.get(i).unwrap_or_default();
        let optional = |i: Option<usize>| i.and_then(|i| record.get(i)).unwrap_or_default();

        let meta = RowMetadata {
            ts_recv: field(self.ts_recv),
            ts_event: field(self.ts_event),
            rtype: optional(self.rtype),
            publisher_id: optional(self.publisher_id),
            instrument_id: optional(self.instrument_id),
            action: field(self.action),
            side: field(self.side),
            channel_id: optional(self.channel_id),
            price: field(self.price),
            size: field(self.size),
            flags: optional(self.flags),
            ts_in_delta: optional(self.ts_in_delta),
            sequence: optional(self.sequence),
            symbol: optional(self.symbol),
            order_id: field(self.order_id),
        };
        let event =
            BookEvent::from_fields(meta.action, meta.side, meta.order_id, meta.price, meta.size);

        Some(FeedRow { event, meta })
    }
}

/// Passthrough fields of one input row, echoed verbatim to the output.
///
/// Missing optional columns read as empty text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowMetadata<'r> {
    pub ts_recv: &'r str,
    pub ts_event: &'r str,
    pub rtype: &'r str,
    pub publisher_id: &'r str,
    pub instrument_id: &'r str,
    pub action: &'r str,
    pub side: &'r str,
    pub channel_id: &'r str,
    pub price: &'r str,
    pub size: &'r str,
    pub flags: &'r str,
    pub ts_in_delta: &'r str,
    pub sequence: &'r str,
    pub symbol: &'r str,
    pub order_id: &'r str,
}

impl<'r> RowMetadata<'r> {
    /// Fields written between the row counter and the bid levels.
    pub fn leading_fields(&self) -> [&'r str; 13] {
        [
            self.ts_recv,
            self.ts_event,
            self.rtype,
            self.publisher_id,
            self.instrument_id,
            self.action,
            self.side,
            self.channel_id,
            self.price,
            self.size,
            self.flags,
            self.ts_in_delta,
            self.sequence,
        ]
    }
}

/// A decoded input row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedRow<'r> {
    pub event: BookEvent<'r>,
    pub meta: RowMetadata<'r>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Action, Side};

    const DATABENTO_HEADER: &str = "ts_recv,ts_event,rtype,publisher_id,instrument_id,action,side,price,size,channel_id,order_id,flags,ts_in_delta,sequence,symbol";

    fn header() -> StringRecord {
        StringRecord::from(DATABENTO_HEADER.split(',').collect::<Vec<_>>())
    }

    fn row(line: &str) -> StringRecord {
        StringRecord::from(line.split(',').collect::<Vec<_>>())
    }

    #[test]
    fn test_column_map_resolves_databento_header() {
        let columns = ColumnMap::from_headers(&header()).unwrap();
        assert_eq!(columns.ts_recv, 0);
        assert_eq!(columns.action, 5);
        assert_eq!(columns.order_id, 10);
        assert_eq!(columns.symbol, Some(14));
        assert_eq!(columns.required_len(), 15);
    }

    #[test]
    fn test_missing_required_columns() {
        let header = StringRecord::from(vec!["ts_recv", "action", "side", "size"]);
        match ColumnMap::from_headers(&header) {
            Err(MbpError::MissingColumns(missing)) => {
                assert_eq!(missing, vec!["ts_event", "price", "order_id"]);
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn test_optional_columns_may_be_absent() {
        let header = StringRecord::from(REQUIRED_COLUMNS.to_vec());
        let columns = ColumnMap::from_headers(&header).unwrap();
        assert_eq!(columns.symbol, None);

        let record = row("1,2,C,A,5.51,10,99");
        let decoded = columns.decode(&record, REQUIRED_COLUMNS.len()).unwrap();
        assert_eq!(decoded.meta.symbol, "");
        assert_eq!(decoded.meta.channel_id, "");
        assert_eq!(decoded.event.action, Action::Cancel);
        assert_eq!(decoded.event.order_id, 99);
    }

    #[test]
    fn test_decode_full_row() {
        let columns = ColumnMap::from_headers(&header()).unwrap();
        let record = row("1704186000403918695,1704186000402899000,160,2,1108,A,B,5.510000000,100,0,817593,130,165200,851012,ARL");
        let decoded = columns.decode(&record, MIN_ROW_FIELDS).unwrap();

        assert_eq!(decoded.event.action, Action::Add);
        assert_eq!(decoded.event.side, Side::Bid);
        assert_eq!(decoded.event.order_id, 817_593);
        assert_eq!(decoded.event.price_key, 5_510_000);
        assert_eq!(decoded.event.display_price, "5.510000000");
        assert_eq!(decoded.event.size, 100);
        assert_eq!(decoded.meta.symbol, "ARL");
        assert_eq!(decoded.meta.channel_id, "0");
        assert_eq!(decoded.meta.leading_fields()[7], "0");
    }

    #[test]
    fn test_short_rows_are_rejected() {
        let columns = ColumnMap::from_headers(&header()).unwrap();
        let record = row("1,2,160,2,1108,A,B,5.51,100");
        assert!(columns.decode(&record, MIN_ROW_FIELDS).is_none());
        // long enough for the floor, too short for the symbol column
        assert!(columns.decode(&record, 5).is_none());
    }

    #[test]
    fn test_bad_numbers_degrade_to_zero() {
        let columns = ColumnMap::from_headers(&header()).unwrap();
        let record = row("1,2,160,2,1108,A,B,,abc,0,xyz,130,0,1,ARL");
        let decoded = columns.decode(&record, MIN_ROW_FIELDS).unwrap();
        assert_eq!(decoded.event.price_key, 0);
        assert_eq!(decoded.event.size, 0);
        assert_eq!(decoded.event.order_id, 0);
    }

    #[test]
    fn test_open_input_missing_file() {
        let err = open_input("/definitely/not/here.csv").err().unwrap();
        assert!(matches!(err, MbpError::Io { .. }));
    }
}
