//! Per-book aggregate figures

use serde::{Deserialize, Serialize};

use super::{Price, SideBook};

/// Computed metrics for an order book
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookMetrics {
    /// Highest resting bid
    pub best_bid: Option<Price>,

    /// Lowest resting ask
    pub best_ask: Option<Price>,

    /// Best ask minus best bid; negative when the book is crossed,
    /// which is allowed since nothing is ever matched
    pub spread: Option<Price>,

    /// Total bid size
    pub bid_depth: u64,

    /// Total ask size
    pub ask_depth: u64,

    pub bid_levels: usize,
    pub ask_levels: usize,
    pub bid_orders: usize,
    pub ask_orders: usize,
}

impl BookMetrics {
    pub(crate) fn from_sides(bids: &SideBook, asks: &SideBook) -> Self {
        let best_bid = bids.best_price();
        let best_ask = asks.best_price();
        Self {
            best_bid,
            best_ask,
            spread: match (best_bid, best_ask) {
                (Some(bid), Some(ask)) => Some(ask - bid),
                _ => None,
            },
            bid_depth: bids.total_size(),
            ask_depth: asks.total_size(),
            bid_levels: bids.level_count(),
            ask_levels: asks.level_count(),
            bid_orders: bids.len(),
            ask_orders: asks.len(),
        }
    }

    /// Whether the best bid is at or above the best ask
    pub fn is_crossed(&self) -> bool {
        matches!(self.spread, Some(spread) if spread <= 0.0)
    }

    pub fn total_orders(&self) -> usize {
        self.bid_orders + self.ask_orders
    }
}
