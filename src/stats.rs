//! Run counters exported in Prometheus text format

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::error::{OrderBookError, Result};

/// Counters for one processing run
pub struct ProcessorStats {
    registry: Registry,
    records: IntCounterVec,
    rejected: IntCounterVec,
    books_reclaimed: IntCounter,
}

impl ProcessorStats {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let records = IntCounterVec::new(
            Opts::new("orderbook_records_total", "Feed records applied to a book"),
            &["operation"],
        )
        .map_err(metrics_error)?;
        let rejected = IntCounterVec::new(
            Opts::new("orderbook_rejected_total", "Feed records rejected"),
            &["kind"],
        )
        .map_err(metrics_error)?;
        let books_reclaimed = IntCounter::new(
            "orderbook_books_reclaimed_total",
            "Books reclaimed after a delete drained them",
        )
        .map_err(metrics_error)?;

        registry
            .register(Box::new(records.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(rejected.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(books_reclaimed.clone()))
            .map_err(metrics_error)?;

        Ok(Self {
            registry,
            records,
            rejected,
            books_reclaimed,
        })
    }

    pub fn record_applied(&self, operation: char) {
        let label = operation.to_string();
        self.records.with_label_values(&[label.as_str()]).inc();
    }

    pub fn record_rejected(&self, error: &OrderBookError) {
        self.rejected.with_label_values(&[error.kind()]).inc();
    }

    pub fn record_reclaimed(&self) {
        self.books_reclaimed.inc();
    }

    pub fn applied(&self, operation: char) -> u64 {
        let label = operation.to_string();
        self.records.with_label_values(&[label.as_str()]).get()
    }

    pub fn rejected(&self, kind: &str) -> u64 {
        self.rejected.with_label_values(&[kind]).get()
    }

    pub fn reclaimed(&self) -> u64 {
        self.books_reclaimed.get()
    }

    /// Render every counter in the text exposition format
    pub fn encode(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(metrics_error)?;
        String::from_utf8(buffer).map_err(|e| OrderBookError::Config(format!("metrics: {}", e)))
    }
}

fn metrics_error(err: prometheus::Error) -> OrderBookError {
    OrderBookError::Config(format!("metrics: {}", err))
}
