//! End-to-end MBO → MBP-10 conversion.
//!
//! One input row in, at most one output row out: decode, apply to the book,
//! dump the top 10 levels, write. Malformed rows are dropped without output
//! and without touching the book; the row counter only advances on rows that
//! were written.
//!
//! # Example
//!
//! ```
//! use mbo_mbp_reconstructor::{ConvertConfig, Converter};
//!
//! let input = "ts_recv,ts_event,action,side,price,size,order_id\n\
//!              1,1,A,B,5.51,100,1\n\
//!              2,2,C,B,5.51,40,1\n";
//! let mut output = Vec::new();
//!
//! let config = ConvertConfig::new().with_min_row_fields(7);
//! let summary = Converter::new(config).run(input.as_bytes(), &mut output).unwrap();
//! assert_eq!(summary.rows_written, 2);
//! ```

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use csv::StringRecord;
use serde::{Deserialize, Serialize};

use crate::error::{MbpError, Result};
use crate::lob::{BookEngine, BookStats, EngineConfig};
use crate::source::{feed_reader, open_input, ColumnMap, IO_BUFFER_SIZE, MIN_ROW_FIELDS};
use crate::writer::MbpWriter;

/// Output file written by the command-line tool.
pub const OUTPUT_FILE_NAME: &str = "mbp_new.csv";

/// Configuration for a conversion run.
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Book behavior
    pub engine: EngineConfig,

    /// Rows with fewer fields are skipped
    pub min_row_fields: usize,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            min_row_fields: MIN_ROW_FIELDS,
        }
    }
}

impl ConvertConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_engine_config(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_min_row_fields(mut self, min_row_fields: usize) -> Self {
        self.min_row_fields = min_row_fields;
        self
    }
}

/// Outcome of a conversion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertSummary {
    /// Data rows read (header excluded)
    pub rows_read: u64,

    /// Output rows written
    pub rows_written: u64,

    /// Malformed rows dropped
    pub rows_skipped: u64,

    /// Book counters at the end of the run
    pub book: BookStats,
}

impl ConvertSummary {
    /// Save to JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }

    /// Load from JSON file.
    pub fn load_json(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }
}

/// Drives a [`BookEngine`] over an MBO CSV stream.
///
/// Each run starts from an empty book; the book from the last run stays
/// readable through [`Converter::engine`] until the next one.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    config: ConvertConfig,
    engine: BookEngine,
}

impl Converter {
    pub fn new(config: ConvertConfig) -> Self {
        let engine = BookEngine::with_config(config.engine.clone());
        Self { config, engine }
    }

    /// Convert `input` into an MBP file at `output`.
    ///
    /// The input header is validated before `output` is created, so a bad
    /// header leaves no output file behind.
    pub fn convert_file(
        &mut self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<ConvertSummary> {
        let (input, output) = (input.as_ref(), output.as_ref());
        let mut reader = feed_reader(open_input(input)?);
        let columns = ColumnMap::from_headers(reader.headers()?)?;

        let file = File::create(output).map_err(|e| MbpError::io(output, e))?;
        let mut writer = MbpWriter::new(BufWriter::with_capacity(IO_BUFFER_SIZE, file));

        log::info!("Converting {} -> {}", input.display(), output.display());
        self.pump(&mut reader, &columns, &mut writer)
    }

    /// Convert an in-memory or streamed CSV.
    pub fn run<R: Read, W: Write>(&mut self, input: R, output: W) -> Result<ConvertSummary> {
        let mut reader = feed_reader(input);
        let columns = ColumnMap::from_headers(reader.headers()?)?;
        let mut writer = MbpWriter::new(output);
        self.pump(&mut reader, &columns, &mut writer)
    }

    fn pump<R: Read, W: Write>(
        &mut self,
        reader: &mut csv::Reader<R>,
        columns: &ColumnMap,
        writer: &mut MbpWriter<W>,
    ) -> Result<ConvertSummary> {
        self.engine.reset();
        writer.write_header()?;

        let mut summary = ConvertSummary::default();
        let mut record = StringRecord::new();
        loop {
            match reader.read_record(&mut record) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) if matches!(e.kind(), csv::ErrorKind::Utf8 { .. }) => {
                    summary.rows_read += 1;
                    summary.rows_skipped += 1;
                    log::trace!("Skipping non-UTF-8 row: {e}");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
            summary.rows_read += 1;

            let Some(row) = columns.decode(&record, self.config.min_row_fields) else {
                summary.rows_skipped += 1;
                log::trace!(
                    "Skipping malformed row {} ({} fields)",
                    summary.rows_read,
                    record.len()
                );
                continue;
            };

            self.engine.apply(&row.event);
            writer.write_row(summary.rows_written, &row.meta, &self.engine.snapshot())?;
            summary.rows_written += 1;
        }
        writer.flush()?;

        summary.book = self.engine.stats().clone();
        log::info!(
            "Wrote {} rows ({} skipped, {} resting orders)",
            summary.rows_written,
            summary.rows_skipped,
            summary.book.active_orders
        );
        Ok(summary)
    }

    /// The book as left by the last run.
    pub fn engine(&self) -> &BookEngine {
        &self.engine
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }
}
