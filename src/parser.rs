//! Parser for the delimited order feed
//!
//! One record per line: `symbol|op|[side|]id[|size|price]`, where `op` is
//! `A` (add, carries side, size and price), `M` (modify, carries size and
//! price) or `D` (delete). Only the first character of `op` and `side`
//! is significant. Trailing extra fields are ignored.

use std::str::{FromStr, Split};

use crate::error::{OrderBookError, Result};
use crate::orderbook::{OrderId, Price, Quantity};

/// Default field delimiter
pub const DEFAULT_DELIMITER: char = '|';

/// The operation a record asks for
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operation {
    /// `side` is the raw wire code; it is validated against the book
    Add {
        side: char,
        size: Quantity,
        price: Price,
    },
    Modify {
        size: Quantity,
        price: Price,
    },
    Delete,
}

impl Operation {
    /// Wire code of the operation
    pub fn code(&self) -> char {
        match self {
            Operation::Add { .. } => 'A',
            Operation::Modify { .. } => 'M',
            Operation::Delete => 'D',
        }
    }
}

/// A parsed feed record
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub symbol: String,
    pub id: OrderId,
    pub operation: Operation,
}

impl Record {
    /// Parse a single feed line
    pub fn parse(line: &str, delimiter: char) -> Result<Self> {
        let mut fields = Fields {
            inner: line.split(delimiter),
        };

        let symbol = fields.next("symbol")?.to_string();
        let op = fields.next_code("operation")?;

        let record = match op {
            'A' => {
                let side = fields.next_code("side")?;
                let id = fields.next_parsed("id")?;
                let size = fields.next_parsed("size")?;
                let price = fields.next_price()?;
                Record {
                    symbol,
                    id,
                    operation: Operation::Add { side, size, price },
                }
            }
            'M' => {
                let id = fields.next_parsed("id")?;
                let size = fields.next_parsed("size")?;
                let price = fields.next_price()?;
                Record {
                    symbol,
                    id,
                    operation: Operation::Modify { size, price },
                }
            }
            'D' => Record {
                symbol,
                id: fields.next_parsed("id")?,
                operation: Operation::Delete,
            },
            other => return Err(OrderBookError::InvalidOperation(other)),
        };

        Ok(record)
    }
}

struct Fields<'a> {
    inner: Split<'a, char>,
}

impl<'a> Fields<'a> {
    /// Next field, which must be present and non-empty
    fn next(&mut self, name: &str) -> Result<&'a str> {
        match self.inner.next() {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(OrderBookError::MalformedRecord(format!("missing {}", name))),
        }
    }

    fn next_code(&mut self, name: &str) -> Result<char> {
        let token = self.next(name)?;
        token
            .chars()
            .next()
            .ok_or_else(|| OrderBookError::MalformedRecord(format!("missing {}", name)))
    }

    fn next_parsed<T: FromStr>(&mut self, name: &str) -> Result<T> {
        let token = self.next(name)?;
        token.parse().map_err(|_| {
            OrderBookError::MalformedRecord(format!("invalid {} {:?}", name, token))
        })
    }

    fn next_price(&mut self) -> Result<Price> {
        let price: Price = self.next_parsed("price")?;
        if price.is_finite() {
            Ok(price)
        } else {
            Err(OrderBookError::MalformedRecord(format!(
                "invalid price {}",
                price
            )))
        }
    }
}
