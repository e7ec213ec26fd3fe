//! MBP-10 CSV output.
//!
//! Each row is: zero-based row counter, 13 echoed metadata fields, 10 bid
//! `(px, sz, ct)` triples, 10 ask triples, symbol, order id. Nothing is ever
//! quoted, so echoed fields come out byte-for-byte as they went in.

use std::fmt::Write as _;
use std::io::Write;

use crate::error::Result;
use crate::snapshot::{DepthSnapshot, LevelView};
use crate::source::{RowMetadata, IO_BUFFER_SIZE};
use crate::types::MBP_DEPTH;

/// Header names of the echoed metadata fields, in output order.
///
/// The `depth` slot carries the input's `channel_id` (empty when absent).
pub const METADATA_COLUMNS: [&str; 13] = [
    "ts_recv",
    "ts_event",
    "rtype",
    "publisher_id",
    "instrument_id",
    "action",
    "side",
    "depth",
    "price",
    "size",
    "flags",
    "ts_in_delta",
    "sequence",
];

/// Fields per output row.
pub const ROW_WIDTH: usize = 1 + METADATA_COLUMNS.len() + 2 * 3 * MBP_DEPTH + 2;

/// Streaming writer for MBP-10 rows.
pub struct MbpWriter<W: Write> {
    inner: csv::Writer<W>,
    /// Reused buffer for number formatting
    scratch: String,
}

impl<W: Write> MbpWriter<W> {
    pub fn new(writer: W) -> Self {
        let inner = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Never)
            .terminator(csv::Terminator::Any(b'\n'))
            .buffer_capacity(IO_BUFFER_SIZE)
            .from_writer(writer);
        Self {
            inner,
            scratch: String::with_capacity(24),
        }
    }

    /// Write the header line. The row-counter column has an empty name.
    pub fn write_header(&mut self) -> Result<()> {
        self.inner.write_field("")?;
        for name in METADATA_COLUMNS {
            self.inner.write_field(name)?;
        }
        for side in ["bid", "ask"] {
            for rank in 0..MBP_DEPTH {
                for field in ["px", "sz", "ct"] {
                    self.scratch.clear();
                    let _ = write!(self.scratch, "{side}_{field}_{rank:02}");
                    self.inner.write_field(&self.scratch)?;
                }
            }
        }
        self.inner.write_field("symbol")?;
        self.inner.write_field("order_id")?;
        self.end_record()
    }

    /// Write one output row.
    pub fn write_row(
        &mut self,
        row: u64,
        meta: &RowMetadata<'_>,
        snapshot: &DepthSnapshot<'_>,
    ) -> Result<()> {
        self.write_number(row)?;
        for field in meta.leading_fields() {
            self.inner.write_field(field)?;
        }
        for level in snapshot.slots() {
            self.write_level(level)?;
        }
        self.inner.write_field(meta.symbol)?;
        self.inner.write_field(meta.order_id)?;
        self.end_record()
    }

    #[inline]
    fn write_level(&mut self, level: &LevelView<'_>) -> Result<()> {
        self.inner.write_field(level.price)?;
        self.write_number(level.size)?;
        self.write_number(level.count)
    }

    #[inline]
    fn write_number(&mut self, value: impl std::fmt::Display) -> Result<()> {
        self.scratch.clear();
        let _ = write!(self.scratch, "{value}");
        self.inner.write_field(&self.scratch)?;
        Ok(())
    }

    #[inline]
    fn end_record(&mut self) -> Result<()> {
        self.inner.write_record(None::<&[u8]>)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.inner
            .into_inner()
            .map_err(|e| crate::error::MbpError::from(e.into_error()))
    }
}
