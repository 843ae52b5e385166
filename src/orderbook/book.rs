//! Core order book implementation
//!
//! Each side pairs a price-ordered level map with an id index (see
//! [`SideBook`]). Order ids are unique across both sides of one book.

use std::fmt;
use tracing::debug;

use super::{
    BookMetrics, DepthLevel, DepthSnapshot, Order, OrderId, Price, Quantity, Side, SideBook,
};
use crate::error::{OrderBookError, Result};

const COLUMN_WIDTH: usize = 15;

/// Resting orders for a single symbol
#[derive(Debug)]
pub struct OrderBook {
    symbol: String,
    bids: SideBook,
    asks: SideBook,
}

impl OrderBook {
    /// Create a new empty order book
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            bids: SideBook::new(Side::Bid),
            asks: SideBook::new(Side::Ask),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Rest a new order on `side`.
    ///
    /// Fails with `DuplicateOrderId` if `id` rests on either side.
    pub fn add(&mut self, side: Side, id: OrderId, size: Quantity, price: Price) -> Result<()> {
        if self.bids.contains(id) || self.asks.contains(id) {
            return Err(OrderBookError::DuplicateOrderId(id));
        }

        self.side_mut(side).insert(id, size, price);
        debug!(symbol = %self.symbol, ?side, id, size, price, "Order added");
        Ok(())
    }

    /// Modify size and price of a resting order; the side is wherever `id` rests.
    ///
    /// A price change sends the order to the back of its new level.
    pub fn modify(&mut self, id: OrderId, size: Quantity, price: Price) -> Result<()> {
        if self.bids.modify(id, size, price) || self.asks.modify(id, size, price) {
            debug!(symbol = %self.symbol, id, size, price, "Order modified");
            Ok(())
        } else {
            Err(OrderBookError::UnknownOrderId(id))
        }
    }

    /// Cancel a resting order, returning it
    pub fn delete(&mut self, id: OrderId) -> Result<Order> {
        let order = self
            .bids
            .remove(id)
            .or_else(|| self.asks.remove(id))
            .ok_or(OrderBookError::UnknownOrderId(id))?;

        debug!(symbol = %self.symbol, id, side = ?order.side, "Order deleted");
        Ok(order)
    }

    /// True iff neither side has a resting order
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Resting orders on both sides
    pub fn len(&self) -> usize {
        self.bids.len() + self.asks.len()
    }

    pub fn order(&self, id: OrderId) -> Option<Order> {
        self.bids.get(id).or_else(|| self.asks.get(id))
    }

    /// Bid levels, highest price first
    pub fn bids(&self) -> impl Iterator<Item = DepthLevel> + '_ {
        self.bids.depth()
    }

    /// Ask levels, lowest price first
    pub fn asks(&self) -> impl Iterator<Item = DepthLevel> + '_ {
        self.asks.depth()
    }

    /// Ids resting at `price` on `side`, in time priority
    pub fn orders_at(&self, side: Side, price: Price) -> Vec<OrderId> {
        self.side(side).orders_at(price)
    }

    pub fn metrics(&self) -> BookMetrics {
        BookMetrics::from_sides(&self.bids, &self.asks)
    }

    pub fn snapshot(&self) -> DepthSnapshot {
        DepthSnapshot {
            symbol: self.symbol.clone(),
            bids: self.bids().collect(),
            asks: self.asks().collect(),
            metrics: self.metrics(),
        }
    }

    /// Write the two-column depth view.
    ///
    /// Bids on the left, best (highest) first; asks on the right, best
    /// (lowest) first. One row per level pair; once a side runs out the
    /// other continues alone with its neighbour column left blank.
    pub fn print<W: fmt::Write>(&self, sink: &mut W) -> fmt::Result {
        let w = COLUMN_WIDTH;
        writeln!(sink, "{:>width$}{:>13}", "Bid", "Ask", width = 3 * w)?;
        writeln!(
            sink,
            "{:>w$}{:>w$}{:>w$}{:>w$}{:>w$}{:>w$}",
            "OrderCount", "TotalSize", "Price", "-     Price", "TotalSize", "OrderCount"
        )?;

        let mut bids = self.bids.depth();
        let mut asks = self.asks.depth();
        loop {
            match (bids.next(), asks.next()) {
                (Some(bid), Some(ask)) => {
                    write_bid(sink, &bid)?;
                    write_ask(sink, &ask)?;
                }
                (Some(bid), None) => write_bid(sink, &bid)?,
                (None, Some(ask)) => {
                    write!(sink, "{:width$}", "", width = 3 * w)?;
                    write_ask(sink, &ask)?;
                }
                (None, None) => break,
            }
            writeln!(sink)?;
        }
        Ok(())
    }

    fn side(&self, side: Side) -> &SideBook {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut SideBook {
        match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        }
    }
}

fn write_bid<W: fmt::Write>(sink: &mut W, level: &DepthLevel) -> fmt::Result {
    let w = COLUMN_WIDTH;
    write!(
        sink,
        "{:>w$}{:>w$}{:>w$.4}",
        level.order_count, level.total_size, level.price
    )
}

fn write_ask<W: fmt::Write>(sink: &mut W, level: &DepthLevel) -> fmt::Result {
    let w = COLUMN_WIDTH;
    write!(
        sink,
        "{:>w$.4}{:>w$}{:>w$}",
        level.price, level.total_size, level.order_count
    )
}

impl fmt::Display for OrderBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.print(f)
    }
}
