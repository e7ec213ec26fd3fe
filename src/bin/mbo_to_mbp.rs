//! CLI tool converting an MBO CSV file into MBP-10 depth snapshots.
//!
//! # Usage
//!
//! ```bash
//! cargo run --release --bin mbo_to_mbp -- data/mbo.csv
//! ```
//!
//! Writes `mbp_new.csv` in the current directory. Exits with status 1 on bad
//! usage, an unreadable input, or missing required columns; malformed rows
//! are skipped and do not affect the exit status.
//!
//! Set `RUST_LOG=debug` for book anomalies, `RUST_LOG=trace` for every
//! skipped row.

use std::env;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

use mbo_mbp_reconstructor::{ConvertConfig, Converter, MbpError, Result, OUTPUT_FILE_NAME};

fn parse_args() -> Result<PathBuf> {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map_or("mbo_to_mbp", String::as_str);

    match args.as_slice() {
        [_, input] => Ok(PathBuf::from(input)),
        _ => Err(MbpError::Usage(format!("{program} mbo.csv"))),
    }
}

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let input = match parse_args() {
        Ok(input) => input,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    let start = Instant::now();
    let mut converter = Converter::new(ConvertConfig::default());

    match converter.convert_file(&input, Path::new(OUTPUT_FILE_NAME)) {
        Ok(summary) => {
            let elapsed = start.elapsed();
            log::info!(
                "Processed {} rows in {:.2}s ({:.0} rows/s)",
                summary.rows_read,
                elapsed.as_secs_f64(),
                summary.rows_read as f64 / elapsed.as_secs_f64().max(1e-9)
            );
            match serde_json::to_string(&summary) {
                Ok(json) => log::debug!("Summary: {json}"),
                Err(e) => log::warn!("Could not serialize summary: {e}"),
            }
        }
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    }
}
