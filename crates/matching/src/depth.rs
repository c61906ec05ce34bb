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

use std::cmp::Reverse;
use std::collections::BTreeMap;

use bourse_types::Side;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

use crate::types::{DepthOp, Position};

/// Aggregate quantity resting at one price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DepthLevel {
	pub price: Decimal,
	pub qty: Decimal,
}

/// Top-N depth snapshot of both sides
///
/// Levels are ordered by matching priority (best price first). Each side
/// carries the sequence id of the last delta applied to it so consumers
/// can detect gaps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DepthData {
	pub bids: Vec<DepthLevel>,
	pub asks: Vec<DepthLevel>,
	pub bid_seq_id: u64,
	pub ask_seq_id: u64,
}

/// Per-price aggregate depth, maintained from book deltas
///
/// Knows nothing about individual orders; the engine feeds it one
/// `Position` per book mutation so the public depth view never needs
/// a walk over the book.
#[derive(Debug, Clone, Default)]
pub struct DepthHandler {
	/// Buy side: price (high to low) -> total quantity
	bids: BTreeMap<Reverse<Decimal>, Decimal>,
	/// Sell side: price (low to high) -> total quantity
	asks: BTreeMap<Decimal, Decimal>,
	bid_seq_id: u64,
	ask_seq_id: u64,
}

impl DepthHandler {
	pub fn new() -> Self {
		Self::default()
	}

	/// Apply one depth delta stamped with `seq_id`
	pub fn update_depth(&mut self, position: &Position, side: Side, op: DepthOp, seq_id: u64) {
		match side {
			Side::Buy => {
				apply(&mut self.bids, Reverse(position.price), position, op);
				self.bid_seq_id = seq_id;
			}
			Side::Sell => {
				apply(&mut self.asks, position.price, position, op);
				self.ask_seq_id = seq_id;
			}
		}
	}

	/// Top `level` price levels of each side
	pub fn get_depth(&self, level: i32) -> DepthData {
		let level = usize::try_from(level).unwrap_or(0);
		DepthData {
			bids: self
				.bids
				.iter()
				.take(level)
				.map(|(price, qty)| DepthLevel {
					price: price.0,
					qty: *qty,
				})
				.collect(),
			asks: self
				.asks
				.iter()
				.take(level)
				.map(|(price, qty)| DepthLevel {
					price: *price,
					qty: *qty,
				})
				.collect(),
			bid_seq_id: self.bid_seq_id,
			ask_seq_id: self.ask_seq_id,
		}
	}

	/// Aggregate quantity at `price` on `side`
	pub fn level_qty(&self, side: Side, price: Decimal) -> Option<Decimal> {
		match side {
			Side::Buy => self.bids.get(&Reverse(price)).copied(),
			Side::Sell => self.asks.get(&price).copied(),
		}
	}

	/// Number of distinct price levels on `side`
	pub fn level_count(&self, side: Side) -> usize {
		match side {
			Side::Buy => self.bids.len(),
			Side::Sell => self.asks.len(),
		}
	}
}

fn apply<K: Ord>(levels: &mut BTreeMap<K, Decimal>, key: K, position: &Position, op: DepthOp) {
	match op {
		DepthOp::Add => {
			*levels.entry(key).or_insert(Decimal::ZERO) += position.qty;
		}
		DepthOp::Delete => {
			let Some(total) = levels.get_mut(&key) else {
				warn!(
					target: "engine",
					price = %position.price,
					qty = %position.qty,
					"Depth delete for unknown price level"
				);
				return;
			};
			*total -= position.qty;
			if *total <= Decimal::ZERO {
				levels.remove(&key);
			}
		}
	}
}
