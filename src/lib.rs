//! Order Book Processor Library
//!
//! This crate keeps one resting-order book per symbol behind a trie registry,
//! and applies a pipe-delimited add/modify/delete feed to those books.

pub mod config;
pub mod error;
pub mod orderbook;
pub mod parser;
pub mod processor;
pub mod stats;

pub use config::{Config, DumpFormat, LogFormat};
pub use error::{OrderBookError, Result};
pub use orderbook::{
    BookMetrics, DepthLevel, DepthSnapshot, Order, OrderBook, OrderBookManager, OrderId, Side,
};
pub use parser::{Operation, Record};
pub use processor::{OrderProcessor, RunSummary};
pub use stats::ProcessorStats;
