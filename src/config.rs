//! Configuration module for the order book processor

use clap::ValueEnum;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{OrderBookError, Result};
use crate::parser::DEFAULT_DELIMITER;

/// What to write after the feed is exhausted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DumpFormat {
    /// Nothing
    #[default]
    Off,
    /// Depth view of every book, lexicographic by symbol
    Text,
    /// JSON array of depth snapshots
    Json,
}

impl FromStr for DumpFormat {
    type Err = OrderBookError;

    fn from_str(s: &str) -> Result<Self> {
        <DumpFormat as ValueEnum>::from_str(s, true)
            .map_err(|_| OrderBookError::Config(format!("unknown dump format {:?}", s)))
    }
}

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = OrderBookError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(OrderBookError::Config(format!("unknown log format {:?}", s))),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Field separator of the feed
    pub delimiter: char,

    /// Follow a book-level error report with the book's depth view
    pub print_book_on_error: bool,

    /// Final dump of every book
    pub dump_format: DumpFormat,

    /// Where to write Prometheus counters once the run ends
    pub metrics_path: Option<PathBuf>,

    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup, falling back to defaults for absent keys
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let delimiter = match lookup("FIELD_DELIMITER") {
            Some(value) => parse_delimiter(&value)?,
            None => defaults.delimiter,
        };

        Ok(Self {
            delimiter,
            print_book_on_error: lookup("PRINT_BOOK_ON_ERROR")
                .map(|v| parse_bool("PRINT_BOOK_ON_ERROR", &v))
                .transpose()?
                .unwrap_or(defaults.print_book_on_error),
            dump_format: lookup("DUMP_FORMAT")
                .map(|v| v.parse())
                .transpose()?
                .unwrap_or(defaults.dump_format),
            metrics_path: lookup("METRICS_PATH")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            log_format: lookup("LOG_FORMAT")
                .map(|v| v.parse())
                .transpose()?
                .unwrap_or(defaults.log_format),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            print_book_on_error: true,
            dump_format: DumpFormat::Off,
            metrics_path: None,
            log_format: LogFormat::Text,
        }
    }
}

/// Exactly one character
pub fn parse_delimiter(value: &str) -> Result<char> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Ok(ch),
        _ => Err(OrderBookError::Config(format!(
            "delimiter must be a single character, got {:?}",
            value
        ))),
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(OrderBookError::Config(format!(
            "{} must be a boolean, got {:?}",
            key, value
        ))),
    }
}
