//! One side of an order book
//!
//! Price levels live in a `BTreeMap` keyed by price. Orders live in a slab
//! arena and are chained FIFO within their level; the id index maps an order
//! id to its slab handle, so mutation and cancellation never walk the ladder.

use ordered_float::OrderedFloat;
use slab::Slab;
use std::collections::{BTreeMap, HashMap};

use super::{DepthLevel, Order, OrderId, Price, Quantity, Side};

type Handle = usize;
type PriceKey = OrderedFloat<Price>;

#[derive(Debug, Clone)]
struct OrderNode {
    id: OrderId,
    size: Quantity,
    price: PriceKey,
    prev: Option<Handle>,
    next: Option<Handle>,
}

/// Head/tail of the FIFO chain at one price, plus running aggregates
#[derive(Debug, Clone, Default)]
struct Level {
    head: Option<Handle>,
    tail: Option<Handle>,
    total_size: u64,
    order_count: usize,
}

/// Price-level index and order-id index for a single side
#[derive(Debug)]
pub struct SideBook {
    side: Side,
    levels: BTreeMap<PriceKey, Level>,
    orders: Slab<OrderNode>,
    index: HashMap<OrderId, Handle>,
}

impl SideBook {
    /// Create an empty side
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
            orders: Slab::new(),
            index: HashMap::new(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Number of resting orders
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of distinct prices
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn contains(&self, id: OrderId) -> bool {
        self.index.contains_key(&id)
    }

    /// Look up a resting order by id
    pub fn get(&self, id: OrderId) -> Option<Order> {
        let handle = *self.index.get(&id)?;
        let node = &self.orders[handle];
        Some(Order {
            id: node.id,
            side: self.side,
            size: node.size,
            price: node.price.into_inner(),
        })
    }

    /// Rest a new order behind every order already at `price`.
    ///
    /// Returns false, leaving the side untouched, if `id` is already present.
    pub fn insert(&mut self, id: OrderId, size: Quantity, price: Price) -> bool {
        if self.index.contains_key(&id) {
            return false;
        }

        let handle = self.orders.insert(OrderNode {
            id,
            size,
            price: OrderedFloat(price),
            prev: None,
            next: None,
        });
        self.link_back(handle);
        self.index.insert(id, handle);
        true
    }

    /// Change size and price of a resting order.
    ///
    /// An unchanged price keeps the order's place in its level; a new price
    /// moves it to the back of the new level. Returns false if `id` is absent.
    pub fn modify(&mut self, id: OrderId, size: Quantity, price: Price) -> bool {
        let Some(&handle) = self.index.get(&id) else {
            return false;
        };

        let price = OrderedFloat(price);
        if self.orders[handle].price == price {
            let old = std::mem::replace(&mut self.orders[handle].size, size);
            if let Some(level) = self.levels.get_mut(&price) {
                level.total_size = level.total_size - u64::from(old) + u64::from(size);
            }
        } else {
            self.unlink(handle);
            let node = &mut self.orders[handle];
            node.price = price;
            node.size = size;
            self.link_back(handle);
        }
        true
    }

    /// Remove a resting order from both indexes
    pub fn remove(&mut self, id: OrderId) -> Option<Order> {
        let handle = self.index.remove(&id)?;
        self.unlink(handle);
        let node = self.orders.remove(handle);
        Some(Order {
            id: node.id,
            side: self.side,
            size: node.size,
            price: node.price.into_inner(),
        })
    }

    /// Aggregated levels, best price first (bids descending, asks ascending)
    pub fn depth(&self) -> Box<dyn Iterator<Item = DepthLevel> + '_> {
        let levels = self.levels.iter().map(|(price, level)| DepthLevel {
            price: price.into_inner(),
            total_size: level.total_size,
            order_count: level.order_count,
        });
        match self.side {
            Side::Bid => Box::new(levels.rev()),
            Side::Ask => Box::new(levels),
        }
    }

    /// Best price on this side
    pub fn best_price(&self) -> Option<Price> {
        let key = match self.side {
            Side::Bid => self.levels.last_key_value(),
            Side::Ask => self.levels.first_key_value(),
        };
        key.map(|(price, _)| price.into_inner())
    }

    /// Total resting size across all levels
    pub fn total_size(&self) -> u64 {
        self.levels.values().map(|level| level.total_size).sum()
    }

    /// Order ids resting at `price`, in time priority
    pub fn orders_at(&self, price: Price) -> Vec<OrderId> {
        let mut ids = Vec::new();
        let mut cursor = self
            .levels
            .get(&OrderedFloat(price))
            .and_then(|level| level.head);
        while let Some(handle) = cursor {
            let node = &self.orders[handle];
            ids.push(node.id);
            cursor = node.next;
        }
        ids
    }

    /// Append an unlinked node to the tail of its price level
    fn link_back(&mut self, handle: Handle) {
        let (price, size) = {
            let node = &self.orders[handle];
            (node.price, node.size)
        };

        let level = self.levels.entry(price).or_default();
        let prev_tail = level.tail;
        if level.head.is_none() {
            level.head = Some(handle);
        }
        level.tail = Some(handle);
        level.total_size += u64::from(size);
        level.order_count += 1;

        if let Some(tail) = prev_tail {
            self.orders[tail].next = Some(handle);
        }
        let node = &mut self.orders[handle];
        node.prev = prev_tail;
        node.next = None;
    }

    /// Detach a node from its level, dropping the level once it drains
    fn unlink(&mut self, handle: Handle) {
        let (price, size, prev, next) = {
            let node = &self.orders[handle];
            (node.price, node.size, node.prev, node.next)
        };

        if let Some(p) = prev {
            self.orders[p].next = next;
        }
        if let Some(n) = next {
            self.orders[n].prev = prev;
        }

        let drained = match self.levels.get_mut(&price) {
            Some(level) => {
                if prev.is_none() {
                    level.head = next;
                }
                if next.is_none() {
                    level.tail = prev;
                }
                level.total_size -= u64::from(size);
                level.order_count -= 1;
                level.order_count == 0
            }
            None => false,
        };
        if drained {
            self.levels.remove(&price);
        }

        let node = &mut self.orders[handle];
        node.prev = None;
        node.next = None;
    }
}
