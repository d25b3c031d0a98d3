use crate::data::{Price, PriceError};
use chrono::{DateTime, Local};
use log::debug;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const LEDGER_FILE_NAME: &str = "last_price.txt";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const ENTRY_SEPARATOR: char = '-';

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("ledger {0} is empty")]
    Empty(PathBuf),
    #[error("malformed ledger line {line:?}: {source}")]
    Malformed {
        line: String,
        #[source]
        source: PriceError,
    },
}

pub trait PriceRepository {
    fn save_price(&self, price: &Price) -> Result<(), LedgerError>;
    /// `Ok(None)` means there is no history yet.
    fn last_price(&self) -> Result<Option<Price>, LedgerError>;
}

/// Append-only text file with one `<timestamp> - <price>` line per observation.
/// Appends from concurrent processes are not coordinated.
pub struct PriceLedger {
    path: PathBuf,
}

impl PriceLedger {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn default_path(base_dir: &Path) -> PathBuf {
        base_dir.join(LEDGER_FILE_NAME)
    }

    fn io_error(&self, source: std::io::Error) -> LedgerError {
        LedgerError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

pub fn format_entry(timestamp: DateTime<Local>, price: &Price) -> String {
    format!("{} - {}\n", timestamp.format(TIMESTAMP_FORMAT), price)
}

/// Extracts the price after the last separator of a ledger line.
pub fn parse_entry(line: &str) -> Result<Price, LedgerError> {
    let line = line.trim();
    let price_text = line.rsplit(ENTRY_SEPARATOR).next().unwrap_or(line);
    Price::parse_localized(price_text).map_err(|source| LedgerError::Malformed {
        line: line.to_string(),
        source,
    })
}

impl PriceRepository for PriceLedger {
    fn save_price(&self, price: &Price) -> Result<(), LedgerError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;

        file.write_all(format_entry(Local::now(), price).as_bytes())
            .map_err(|e| self.io_error(e))?;

        debug!("Saved price {price} to {}", self.path.display());
        Ok(())
    }

    fn last_price(&self) -> Result<Option<Price>, LedgerError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        let Some(last_line) = content.lines().last() else {
            return Err(LedgerError::Empty(self.path.clone()));
        };

        parse_entry(last_line).map(Some)
    }
}
