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

//! Price/time-priority sweep matching
//!
//! Every variant walks the opposite book in priority order and compares
//! the taker's remaining driver (quantity, or amount for market buys)
//! with the maker's remaining figure:
//! - taker > maker: the maker is consumed and queued for removal, the
//!   taker is part filled and the sweep continues
//! - taker == maker: both are filled, the maker is queued for removal
//! - taker < maker: the taker is filled, the maker stays resting part filled
//!
//! The trade price is always the maker's price. The book itself is only
//! mutated in place here; removals are applied by the engine afterwards.

use std::cmp::Ordering;

use bourse_types::{OrderStatus, Side};
use rust_decimal::Decimal;

use crate::orderbook::OrderBook;
use crate::types::{Key, MatchedRecord, Order};

/// Records and consumed makers of one sweep
#[derive(Debug, Default)]
pub(crate) struct SweepOutcome {
	pub records: Vec<MatchedRecord>,
	/// Keys of makers that reached `AllFilled`, in traversal order
	pub filled: Vec<Key>,
}

/// Quantity-driven sweep used by limit orders and market sells
///
/// `limit` bounds the traversal to makers still marketable against the
/// taker's price; `None` sweeps until the taker or the book is exhausted.
/// A limit taker consumes its frozen amount at its own price, while the
/// traded amount is always computed at the maker's price.
pub(crate) fn sweep_by_quantity(
	book: &mut OrderBook,
	taker: &mut Order,
	limit: Option<Decimal>,
) -> SweepOutcome {
	let mut outcome = SweepOutcome::default();

	for maker in book.iter_mut() {
		if let Some(limit) = limit
			&& !is_marketable(taker.side, limit, maker.price)
		{
			break;
		}

		let (qty, amount) = match taker.unfilled_qty.cmp(&maker.unfilled_qty) {
			Ordering::Greater => {
				let qty = maker.unfilled_qty;
				let amount = maker.unfilled_amount;
				taker.unfilled_qty -= qty;
				if taker.is_limit() {
					taker.unfilled_amount -= qty * taker.price;
				}
				taker.status = OrderStatus::PartFilled;
				consume(maker);
				outcome.filled.push(maker.key());
				(qty, amount)
			}
			Ordering::Equal => {
				let qty = maker.unfilled_qty;
				let amount = maker.unfilled_amount;
				exhaust(taker);
				consume(maker);
				outcome.filled.push(maker.key());
				(qty, amount)
			}
			Ordering::Less => {
				let qty = taker.unfilled_qty;
				let amount = qty * maker.price;
				exhaust(taker);
				maker.unfilled_qty -= qty;
				maker.unfilled_amount -= amount;
				maker.status = OrderStatus::PartFilled;
				(qty, amount)
			}
		};

		fill(taker, maker, qty, amount);
		outcome.records.push(record(taker, maker, qty, amount));

		if taker.status == OrderStatus::AllFilled {
			break;
		}
	}

	outcome
}

/// Amount-driven sweep used by market buys
///
/// When the remaining amount cannot take a whole maker, the tradable
/// quantity is floored to `min_unit`; below one unit the sweep stops
/// without trading.
pub(crate) fn sweep_by_amount(
	book: &mut OrderBook,
	taker: &mut Order,
	min_unit: Decimal,
) -> SweepOutcome {
	let mut outcome = SweepOutcome::default();

	for maker in book.iter_mut() {
		let ordering = taker.unfilled_amount.cmp(&maker.unfilled_amount);
		let (qty, amount) = match ordering {
			Ordering::Greater => {
				let qty = maker.unfilled_qty;
				let amount = maker.unfilled_amount;
				taker.unfilled_amount -= amount;
				taker.status = OrderStatus::PartFilled;
				consume(maker);
				outcome.filled.push(maker.key());
				(qty, amount)
			}
			Ordering::Equal => {
				let qty = maker.unfilled_qty;
				let amount = maker.unfilled_amount;
				taker.unfilled_amount = Decimal::ZERO;
				taker.status = OrderStatus::AllFilled;
				consume(maker);
				outcome.filled.push(maker.key());
				(qty, amount)
			}
			Ordering::Less => {
				let Some(affordable) = taker.unfilled_amount.checked_div(maker.price) else {
					break;
				};
				if affordable < min_unit {
					break;
				}
				let mut qty = (affordable / min_unit).floor() * min_unit;
				// The quotient is rounded to 28 digits and may land one lot high
				while qty * maker.price > taker.unfilled_amount {
					qty -= min_unit;
				}
				if qty < min_unit {
					break;
				}
				let amount = qty * maker.price;
				taker.unfilled_amount -= amount;
				taker.status = if taker.unfilled_amount.is_zero() {
					OrderStatus::AllFilled
				} else {
					OrderStatus::PartFilled
				};
				maker.unfilled_qty -= qty;
				maker.unfilled_amount -= amount;
				maker.status = OrderStatus::PartFilled;
				(qty, amount)
			}
		};

		fill(taker, maker, qty, amount);
		outcome.records.push(record(taker, maker, qty, amount));

		if taker.status == OrderStatus::AllFilled || ordering == Ordering::Less {
			break;
		}
	}

	outcome
}

/// Whether a maker at `maker_price` can trade with a taker limited at `limit`
fn is_marketable(taker_side: Side, limit: Decimal, maker_price: Decimal) -> bool {
	match taker_side {
		Side::Buy => maker_price <= limit,
		Side::Sell => maker_price >= limit,
	}
}

fn consume(maker: &mut Order) {
	maker.unfilled_qty = Decimal::ZERO;
	maker.unfilled_amount = Decimal::ZERO;
	maker.status = OrderStatus::AllFilled;
}

fn exhaust(taker: &mut Order) {
	taker.unfilled_qty = Decimal::ZERO;
	taker.unfilled_amount = Decimal::ZERO;
	taker.status = OrderStatus::AllFilled;
}

// Cumulative, never overwritten
fn fill(taker: &mut Order, maker: &mut Order, qty: Decimal, amount: Decimal) {
	taker.filled_qty += qty;
	maker.filled_qty += qty;
	taker.filled_amount += amount;
	maker.filled_amount += amount;
}

fn record(taker: &Order, maker: &Order, qty: Decimal, amount: Decimal) -> MatchedRecord {
	MatchedRecord {
		price: maker.price,
		qty,
		amount,
		record_id: uuid::Uuid::new_v4().to_string(),
		taker: taker.clone(),
		maker: maker.clone(),
	}
}
