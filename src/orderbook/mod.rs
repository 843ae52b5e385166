//! Order book module
//!
//! Resting-order books per symbol, and the trie registry that owns them.

mod book;
mod manager;
mod metrics;
mod side;

pub use book::OrderBook;
pub use manager::OrderBookManager;
pub use metrics::BookMetrics;
pub use side::SideBook;

use serde::{Deserialize, Serialize};

use crate::error::OrderBookError;

/// Order identifier, unique across both sides of one book
pub type OrderId = u32;

/// Outstanding quantity of an order
pub type Quantity = u32;

/// Limit price
pub type Price = f64;

/// Side of the order book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Bid,
    Ask,
}

impl TryFrom<char> for Side {
    type Error = OrderBookError;

    /// Wire side codes: `B` for bid, `S` for ask
    fn try_from(code: char) -> Result<Self, Self::Error> {
        match code {
            'B' => Ok(Side::Bid),
            'S' => Ok(Side::Ask),
            other => Err(OrderBookError::InvalidSide(other)),
        }
    }
}

/// A resting order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub side: Side,
    pub size: Quantity,
    pub price: Price,
}

/// Aggregate of all resting orders at one price on one side
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthLevel {
    pub price: Price,
    pub total_size: u64,
    pub order_count: usize,
}

/// Serializable depth view of a single book
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepthSnapshot {
    pub symbol: String,
    /// Best (highest) bid first
    pub bids: Vec<DepthLevel>,
    /// Best (lowest) ask first
    pub asks: Vec<DepthLevel>,
    pub metrics: BookMetrics,
}
