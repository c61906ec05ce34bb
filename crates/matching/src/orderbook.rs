// Copyright 2025 itscheems
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::BTreeMap;

use bourse_types::Side;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::{Key, Order};

/// Error types for order book operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderBookError {
	#[error("Order already resting under key {0:?}")]
	DuplicateKey(Key),
}

/// Position of a resting order in its side's priority order
///
/// `rank` is the price for asks and the negated price for bids, so one
/// ascending traversal yields best price first on both sides, ties broken
/// by the earliest sequence id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct PriorityKey {
	rank: Decimal,
	sequence_id: u64,
}

impl PriorityKey {
	fn new(side: Side, key: &Key) -> Self {
		let rank = match side {
			Side::Buy => -key.price,
			Side::Sell => key.price,
		};
		Self {
			rank,
			sequence_id: key.sequence_id,
		}
	}
}

/// One side of a limit order book (single-threaded)
///
/// Resting orders are indexed by their composite key `(price, sequence_id)`
/// in a BTreeMap with a side-specific ordering:
/// - Sell side: lowest price first
/// - Buy side: highest price first
/// - Same price: earliest sequence id first
///
/// Only orders with status `New` or `PartFilled` are ever retained. The
/// book is owned and mutated exclusively by the matching engine.
#[derive(Debug, Clone)]
pub struct OrderBook {
	side: Side,
	orders: BTreeMap<PriorityKey, Order>,
}

impl OrderBook {
	/// Create an empty book for one side
	pub fn new(side: Side) -> Self {
		Self {
			side,
			orders: BTreeMap::new(),
		}
	}

	pub fn side(&self) -> Side {
		self.side
	}

	/// Insert a resting order under its key
	///
	/// Fails when another order already rests under the same key.
	pub fn add(&mut self, order: Order) -> Result<(), OrderBookError> {
		debug_assert!(order.status.is_resting());
		let key = order.key();
		let priority = PriorityKey::new(self.side, &key);
		if self.orders.contains_key(&priority) {
			return Err(OrderBookError::DuplicateKey(key));
		}
		self.orders.insert(priority, order);
		Ok(())
	}

	/// Remove and return the order under `key`, if any
	pub fn remove(&mut self, key: &Key) -> Option<Order> {
		self.orders.remove(&PriorityKey::new(self.side, key))
	}

	pub fn get(&self, key: &Key) -> Option<&Order> {
		self.orders.get(&PriorityKey::new(self.side, key))
	}

	pub fn contains(&self, key: &Key) -> bool {
		self.orders.contains_key(&PriorityKey::new(self.side, key))
	}

	/// Order at the priority-first position
	pub fn best(&self) -> Option<&Order> {
		self.orders.first_key_value().map(|(_, order)| order)
	}

	/// Price of the priority-first order
	pub fn best_price(&self) -> Option<Decimal> {
		self.best().map(|order| order.price)
	}

	/// Resting orders in ascending priority order
	pub fn iter(&self) -> impl Iterator<Item = &Order> {
		self.orders.values()
	}

	/// Mutable traversal in priority order, used by sweep matching
	pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Order> {
		self.orders.values_mut()
	}

	/// Number of resting orders
	pub fn len(&self) -> usize {
		self.orders.len()
	}

	pub fn is_empty(&self) -> bool {
		self.orders.is_empty()
	}
}
