//! Error types for the order book processor

use thiserror::Error;

use crate::orderbook::OrderId;

/// Order book processor errors
#[derive(Error, Debug)]
pub enum OrderBookError {
    #[error("Empty symbol")]
    EmptySymbol,

    #[error("Invalid character {ch:?} in symbol {symbol:?}")]
    InvalidSymbolCharacter { symbol: String, ch: char },

    #[error("OrderID {0} already exists")]
    DuplicateOrderId(OrderId),

    #[error("Bad side {0:?}")]
    InvalidSide(char),

    #[error("OrderID {0} does not exist")]
    UnknownOrderId(OrderId),

    #[error("Bad operation {0:?}")]
    InvalidOperation(char),

    #[error("Bad input line: {0}")]
    MalformedRecord(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl OrderBookError {
    /// Stable label for metrics and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            OrderBookError::EmptySymbol => "empty_symbol",
            OrderBookError::InvalidSymbolCharacter { .. } => "invalid_symbol_character",
            OrderBookError::DuplicateOrderId(_) => "duplicate_order_id",
            OrderBookError::InvalidSide(_) => "invalid_side",
            OrderBookError::UnknownOrderId(_) => "unknown_order_id",
            OrderBookError::InvalidOperation(_) => "invalid_operation",
            OrderBookError::MalformedRecord(_) => "malformed_record",
            OrderBookError::Config(_) => "config",
            OrderBookError::Serialization(_) => "serialization",
            OrderBookError::Io(_) => "io",
        }
    }
}

impl From<serde_json::Error> for OrderBookError {
    fn from(err: serde_json::Error) -> Self {
        OrderBookError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OrderBookError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            OrderBookError::DuplicateOrderId(7).to_string(),
            "OrderID 7 already exists"
        );
        assert_eq!(
            OrderBookError::InvalidSymbolCharacter {
                symbol: "AB1".to_string(),
                ch: '1'
            }
            .to_string(),
            "Invalid character '1' in symbol \"AB1\""
        );
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(OrderBookError::UnknownOrderId(1).kind(), "unknown_order_id");
        assert_eq!(
            OrderBookError::MalformedRecord("missing id".into()).kind(),
            "malformed_record"
        );
    }
}
