//! Price database persistence
//!
//! Appends `P` directives to a plain-text ledger price database:
//!
//! ```text
//! P 2024-01-01 00:00:00 Gold 1850.500000 $
//! ```

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use crate::types::Unit;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const PRICE_DECIMALS: u32 = 6;

/// One price directive
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRecord {
    pub timestamp: NaiveDateTime,
    pub commodity: String,
    pub price: Decimal,
    pub unit: Unit,
}

impl fmt::Display for PriceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "P {} {} {:.prec$} {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            format_commodity(&self.commodity),
            self.price
                .round_dp_with_strategy(PRICE_DECIMALS, RoundingStrategy::MidpointAwayFromZero),
            self.unit,
            prec = PRICE_DECIMALS as usize
        )
    }
}

/// Quote commodity names ledger cannot read bare (digits, spaces, symbols)
pub fn format_commodity(name: &str) -> String {
    let bare = !name.is_empty() && name.chars().all(|c| c.is_alphabetic() || c == '_');
    if bare {
        name.to_string()
    } else {
        format!("\"{}\"", name)
    }
}

/// Append-only price database writer
pub struct PriceDbWriter<W: Write> {
    sink: W,
    written: usize,
}

impl PriceDbWriter<File> {
    /// Open (or create) the database file for appending
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open price database {}", path.display()))?;
        Ok(Self::new(file))
    }
}

impl<W: Write> PriceDbWriter<W> {
    pub fn new(sink: W) -> Self {
        Self { sink, written: 0 }
    }

    /// Append one record as a single line
    pub fn append(&mut self, record: &PriceRecord) -> io::Result<()> {
        let line = format!("{}\n", record);
        self.sink.write_all(line.as_bytes())?;
        self.written += 1;
        Ok(())
    }

    /// Records successfully appended so far
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush and hand back the underlying sink
    pub fn finish(mut self) -> io::Result<W> {
        self.sink.flush()?;
        Ok(self.sink)
    }
}
