//! Order book manager
//!
//! Maps symbols to their books through a prefix tree over `A`..=`Z`.
//! Each node owns its children and at most one book; a node left with
//! neither is pruned as soon as a removal empties it.

use std::fmt;
use tracing::{debug, info};

use super::{DepthSnapshot, OrderBook};
use crate::error::{OrderBookError, Result};

const ALPHABET_SIZE: usize = 26;

#[derive(Debug, Default)]
struct TrieNode {
    children: [Option<Box<TrieNode>>; ALPHABET_SIZE],
    book: Option<OrderBook>,
}

impl TrieNode {
    /// No children and no book
    fn is_vacant(&self) -> bool {
        self.book.is_none() && self.children.iter().all(Option::is_none)
    }

    fn count_nodes(&self) -> usize {
        self.children
            .iter()
            .flatten()
            .map(|child| 1 + child.count_nodes())
            .sum()
    }

    /// Depth-first walk in character order, `prefix` holding the path so far
    fn visit<'a>(&'a self, prefix: &mut String, f: &mut impl FnMut(&str, &'a OrderBook)) {
        if let Some(book) = &self.book {
            f(prefix.as_str(), book);
        }
        for (index, child) in self.children.iter().enumerate() {
            if let Some(child) = child {
                prefix.push(branch_char(index));
                child.visit(prefix, f);
                prefix.pop();
            }
        }
    }
}

/// Manages order books for multiple symbols
#[derive(Debug, Default)]
pub struct OrderBookManager {
    root: TrieNode,
    books: usize,
}

impl OrderBookManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the book for `symbol`, creating it and any missing path on first use
    pub fn get(&mut self, symbol: &str) -> Result<&mut OrderBook> {
        let path = symbol_path(symbol)?;

        let mut node = &mut self.root;
        for index in path {
            node = node.children[index]
                .get_or_insert_with(Box::default)
                .as_mut();
        }

        if node.book.is_none() {
            info!(symbol, "Creating order book");
            self.books += 1;
        }
        Ok(node.book.get_or_insert_with(|| OrderBook::new(symbol)))
    }

    /// Look up an existing book without allocating
    pub fn find(&self, symbol: &str) -> Option<&OrderBook> {
        let path = symbol_path(symbol).ok()?;

        let mut node = &self.root;
        for index in path {
            node = node.children[index].as_deref()?;
        }
        node.book.as_ref()
    }

    /// Drop the book for `symbol` and prune every node the removal leaves vacant.
    ///
    /// Returns the reclaimed book, if there was one.
    pub fn remove(&mut self, symbol: &str) -> Option<OrderBook> {
        let path = symbol_path(symbol).ok()?;
        let removed = remove_path(&mut self.root, &path);
        if removed.is_some() {
            self.books -= 1;
            info!(symbol, "Reclaimed order book");
        }
        removed
    }

    /// Write one book's depth view, or a marker if the symbol has no book
    pub fn print_symbol<W: fmt::Write>(&self, sink: &mut W, symbol: &str) -> fmt::Result {
        match self.find(symbol) {
            Some(book) => {
                writeln!(sink, "Ticker: {}", symbol)?;
                book.print(sink)
            }
            None => writeln!(sink, "Ticker: {} does not exist", symbol),
        }
    }

    /// Write every book's depth view, symbols in lexicographic order
    pub fn print<W: fmt::Write>(&self, sink: &mut W) -> fmt::Result {
        let mut result = Ok(());
        self.for_each(|symbol, book| {
            if result.is_ok() {
                result = write_ticker(sink, symbol, book);
            }
        });
        result
    }

    /// Visit every book in lexicographic symbol order
    pub fn for_each<'a>(&'a self, mut f: impl FnMut(&str, &'a OrderBook)) {
        let mut prefix = String::new();
        self.root.visit(&mut prefix, &mut f);
    }

    /// Symbols that currently own a book, in lexicographic order
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols = Vec::with_capacity(self.books);
        self.for_each(|symbol, _| symbols.push(symbol.to_string()));
        symbols
    }

    /// Depth snapshots of every book, in lexicographic symbol order
    pub fn snapshots(&self) -> Vec<DepthSnapshot> {
        let mut snapshots = Vec::with_capacity(self.books);
        self.for_each(|_, book| snapshots.push(book.snapshot()));
        snapshots
    }

    /// Check if a symbol has a book
    pub fn contains(&self, symbol: &str) -> bool {
        self.find(symbol).is_some()
    }

    /// Number of books
    pub fn len(&self) -> usize {
        self.books
    }

    pub fn is_empty(&self) -> bool {
        self.books == 0
    }

    /// Live trie nodes, not counting the root
    pub fn node_count(&self) -> usize {
        self.root.count_nodes()
    }
}

fn write_ticker<W: fmt::Write>(sink: &mut W, symbol: &str, book: &OrderBook) -> fmt::Result {
    writeln!(sink, "Ticker: {}", symbol)?;
    book.print(sink)?;
    writeln!(sink)
}

/// Descend along `path`, take the terminal book, then unlink vacant nodes
/// on the way back up
fn remove_path(node: &mut TrieNode, path: &[usize]) -> Option<OrderBook> {
    let (&index, rest) = path.split_first()?;
    let child = node.children[index].as_deref_mut()?;

    let removed = if rest.is_empty() {
        child.book.take()
    } else {
        remove_path(child, rest)
    };

    if child.is_vacant() {
        debug!(branch = %branch_char(index), "Pruning trie node");
        node.children[index] = None;
    }
    removed
}

/// Map a symbol to branch indexes, rejecting anything outside `A`..=`Z`
fn symbol_path(symbol: &str) -> Result<Vec<usize>> {
    if symbol.is_empty() {
        return Err(OrderBookError::EmptySymbol);
    }

    symbol
        .chars()
        .map(|ch| {
            if ch.is_ascii_uppercase() {
                Ok(usize::from(ch as u8 - b'A'))
            } else {
                Err(OrderBookError::InvalidSymbolCharacter {
                    symbol: symbol.to_string(),
                    ch,
                })
            }
        })
        .collect()
}

fn branch_char(index: usize) -> char {
    char::from(b'A' + index as u8)
}
