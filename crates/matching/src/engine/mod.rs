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

mod control;
mod runner;
mod sweep;

pub use control::EngineControlMessage;
pub use runner::{EngineConfig, EngineRunner};

use std::time::{SystemTime, UNIX_EPOCH};

use bourse_types::{OrderStatus, OrderType, Side};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::{
	OrderBook,
	depth::{DepthData, DepthHandler},
	types::{
		CancelResult, DepthOp, Key, MatchPayload, MatchResult, Order, Position, SymbolInfo,
		TradeBatch,
	},
};

use sweep::SweepOutcome;

/// Error types for matching engine operations
#[derive(Debug, Error)]
pub enum EngineError {
	#[error("Engine shutdown")]
	Shutdown,
	#[error("Control channel closed")]
	ControlChannelClosed,
	#[error("Failed to spawn matching thread: {0}")]
	Spawn(#[from] std::io::Error),
}

/// Receiver of every result the engine produces
///
/// Called synchronously from the matching thread, in emission order.
pub trait ResultSink: Send {
	fn send_match_result(&mut self, result: MatchResult);
}

/// Why an order was dropped without effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
	/// Cancel for a key that is not resting
	NotFound,
	/// New limit order whose key is already resting
	DuplicateKey,
}

/// Outcome of [`MatchEngine::handle_order`]
#[derive(Debug, Clone, PartialEq)]
pub enum HandleOutcome {
	/// The order was processed; carries its final state
	Accepted(Order),
	/// The order was ignored and the book is unchanged
	Rejected(RejectReason),
}

impl HandleOutcome {
	pub fn order(&self) -> Option<&Order> {
		match self {
			HandleOutcome::Accepted(order) => Some(order),
			HandleOutcome::Rejected(_) => None,
		}
	}

	pub fn is_rejected(&self) -> bool {
		matches!(self, HandleOutcome::Rejected(_))
	}
}

/// Single-symbol matching engine
///
/// Owns both sides of the book, the cached best prices and the aggregated
/// depth. Every call to [`handle_order`](Self::handle_order) runs to
/// completion before the next, so results reach the sink in a total order.
///
/// Invariants held between calls:
/// - `best_bid < best_ask` whenever both are set
/// - every resting order is `New` or `PartFilled` with positive unfilled quantity
/// - the depth of a price level equals the sum of unfilled quantities resting there
pub struct MatchEngine {
	symbol: SymbolInfo,
	bids: OrderBook,
	asks: OrderBook,
	best_bid: Option<Decimal>,
	best_ask: Option<Decimal>,
	depth: DepthHandler,
	current_seq_id: u64,
	sink: Box<dyn ResultSink>,
}

impl MatchEngine {
	pub fn new(symbol: SymbolInfo, sink: Box<dyn ResultSink>) -> Self {
		info!(target: "engine", symbol = %symbol.symbol_name, "Match engine created");
		Self {
			symbol,
			bids: OrderBook::new(Side::Buy),
			asks: OrderBook::new(Side::Sell),
			best_bid: None,
			best_ask: None,
			depth: DepthHandler::new(),
			current_seq_id: 0,
			sink,
		}
	}

	/// Process one inbound order or cancel request
	///
	/// Only limit orders are looked up in the book: a cancel for a missing
	/// key and a new order for a resting key are dropped silently.
	pub fn handle_order(&mut self, order: Order) -> HandleOutcome {
		self.advance_sequence(&order);

		let resting = order.is_limit() && self.book(order.side).contains(&order.key());
		debug!(
			target: "engine",
			order_id = %order.order_id,
			sequence_id = order.sequence_id,
			side = ?order.side,
			order_type = ?order.order_type,
			is_cancel = order.is_cancel,
			best_bid = ?self.best_bid,
			best_ask = ?self.best_ask,
			"Handling order"
		);

		match (order.is_cancel, resting) {
			(true, false) => {
				debug!(target: "engine", order_id = %order.order_id, "Cancel for unknown order ignored");
				HandleOutcome::Rejected(RejectReason::NotFound)
			}
			(false, true) => {
				debug!(target: "engine", order_id = %order.order_id, "Order already resting, ignored");
				HandleOutcome::Rejected(RejectReason::DuplicateKey)
			}
			(true, true) => self.cancel_order(order),
			(false, false) => HandleOutcome::Accepted(self.place_order(order)),
		}
	}

	/// Top `level` aggregated price levels of each side
	pub fn get_depth(&self, level: i32) -> DepthData {
		self.depth.get_depth(level)
	}

	pub fn best_bid(&self) -> Option<Decimal> {
		self.best_bid
	}

	pub fn best_ask(&self) -> Option<Decimal> {
		self.best_ask
	}

	pub fn current_seq_id(&self) -> u64 {
		self.current_seq_id
	}

	pub fn symbol(&self) -> &SymbolInfo {
		&self.symbol
	}

	pub fn bids(&self) -> &OrderBook {
		&self.bids
	}

	pub fn asks(&self) -> &OrderBook {
		&self.asks
	}

	pub fn depth(&self) -> &DepthHandler {
		&self.depth
	}

	/// Resting order under `key` on `side`
	pub fn resting(&self, side: Side, key: &Key) -> Option<&Order> {
		self.book(side).get(key)
	}

	// The sequence mirrors the inbound id once started; the first call seeds it.
	fn advance_sequence(&mut self, order: &Order) {
		if self.current_seq_id != 0 {
			self.current_seq_id = order.sequence_id;
		} else {
			self.current_seq_id += 1;
		}
	}

	fn cancel_order(&mut self, mut order: Order) -> HandleOutcome {
		let side = order.side;
		let Some(resting) = self.book_mut(side).remove(&order.key()) else {
			return HandleOutcome::Rejected(RejectReason::NotFound);
		};
		self.update_best(side);

		order.qty = resting.qty;
		order.amount = resting.amount;
		order.unfilled_qty = resting.unfilled_qty;
		order.unfilled_amount = resting.unfilled_amount;
		order.filled_qty = resting.filled_qty;
		order.filled_amount = resting.filled_amount;
		order.status = OrderStatus::Cancelled;

		self.depth.update_depth(
			&Position::new(order.price, order.unfilled_qty),
			side,
			DepthOp::Delete,
			self.current_seq_id,
		);

		let released = match side {
			Side::Buy => order.unfilled_amount,
			Side::Sell => order.unfilled_qty,
		};
		self.emit_cancel(side, order.sequence_id, released, resting.uid);

		HandleOutcome::Accepted(order)
	}

	fn place_order(&mut self, order: Order) -> Order {
		match (order.side, order.order_type) {
			(Side::Buy, OrderType::Market) => self.match_market_buy(order),
			(Side::Sell, OrderType::Market) => self.match_market_sell(order),
			(Side::Buy, OrderType::Limit) => {
				if self.best_ask.is_some_and(|ask| order.price >= ask) {
					self.match_limit(order)
				} else {
					self.rest(order)
				}
			}
			(Side::Sell, OrderType::Limit) => {
				if self.best_bid.is_some_and(|bid| order.price <= bid) {
					self.match_limit(order)
				} else {
					self.rest(order)
				}
			}
		}
	}

	fn match_limit(&mut self, mut taker: Order) -> Order {
		let limit = Some(taker.price);
		let outcome = sweep::sweep_by_quantity(self.book_mut(taker.side.opposite()), &mut taker, limit);
		self.settle(&mut taker, outcome);
		taker
	}

	fn match_market_sell(&mut self, mut taker: Order) -> Order {
		if self.bids.is_empty() {
			self.release_remainder(&mut taker);
			return taker;
		}
		let outcome = sweep::sweep_by_quantity(&mut self.bids, &mut taker, None);
		self.settle(&mut taker, outcome);
		taker
	}

	fn match_market_buy(&mut self, mut taker: Order) -> Order {
		if self.asks.is_empty() {
			self.release_remainder(&mut taker);
			return taker;
		}
		let min_unit = self.symbol.base_min_unit();
		let outcome = sweep::sweep_by_amount(&mut self.asks, &mut taker, min_unit);
		self.settle(&mut taker, outcome);
		taker
	}

	/// Apply a finished sweep to the books, depth and sink
	fn settle(&mut self, taker: &mut Order, outcome: SweepOutcome) {
		let maker_side = taker.side.opposite();
		let SweepOutcome { records, filled } = outcome;

		let book = self.book_mut(maker_side);
		for key in &filled {
			book.remove(key);
		}
		self.update_best(maker_side);

		if taker.is_limit() && taker.status == OrderStatus::PartFilled {
			*taker = self.rest(taker.clone());
		}

		for record in &records {
			self.depth.update_depth(
				&Position::new(record.price, record.qty),
				maker_side,
				DepthOp::Delete,
				self.current_seq_id,
			);
		}

		if let Some(batch) = TradeBatch::new(records, taker.side.is_buy()) {
			debug!(
				target: "engine",
				order_id = %taker.order_id,
				records = batch.records.len(),
				qty = %batch.qty,
				amount = %batch.amount,
				"Order matched"
			);
			self.emit(taker.side.is_buy(), MatchPayload::Trades(batch));
		}

		if taker.is_market() && taker.status != OrderStatus::AllFilled {
			self.release_remainder(taker);
		}
	}

	/// Release whatever a market order could not trade
	fn release_remainder(&mut self, taker: &mut Order) {
		if taker.status == OrderStatus::New {
			taker.status = OrderStatus::Cancelled;
		}
		let released = match taker.side {
			Side::Buy => taker.unfilled_amount,
			Side::Sell => taker.unfilled_qty,
		};
		self.emit_cancel(taker.side, taker.sequence_id, released, taker.uid);
	}

	fn rest(&mut self, order: Order) -> Order {
		let side = order.side;
		let position = Position::new(order.price, order.unfilled_qty);
		if let Err(e) = self.book_mut(side).add(order.clone()) {
			error!(target: "engine", error = %e, order_id = %order.order_id, "Failed to rest order");
			return order;
		}
		self.update_best(side);
		self.depth
			.update_depth(&position, side, DepthOp::Add, self.current_seq_id);
		order
	}

	fn update_best(&mut self, side: Side) {
		match side {
			Side::Buy => self.best_bid = self.bids.best_price(),
			Side::Sell => self.best_ask = self.asks.best_price(),
		}
	}

	fn emit_cancel(&mut self, side: Side, sequence_id: u64, qty: Decimal, uid: u64) {
		let cancel = CancelResult {
			sequence_id,
			coin_id: self.symbol.release_coin(side),
			qty,
			uid,
		};
		self.emit(side.is_buy(), MatchPayload::Cancel(cancel));
	}

	fn emit(&mut self, taker_is_buy: bool, payload: MatchPayload) {
		let result = MatchResult {
			match_id: uuid::Uuid::new_v4().to_string(),
			match_time: now_nanos(),
			taker_is_buy,
			payload,
		};
		self.sink.send_match_result(result);
	}

	fn book(&self, side: Side) -> &OrderBook {
		match side {
			Side::Buy => &self.bids,
			Side::Sell => &self.asks,
		}
	}

	fn book_mut(&mut self, side: Side) -> &mut OrderBook {
		match side {
			Side::Buy => &mut self.bids,
			Side::Sell => &mut self.asks,
		}
	}
}

/// Wall-clock time in nanoseconds since the Unix epoch
pub(crate) fn now_nanos() -> i64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| i64::try_from(d.as_nanos()).unwrap_or(i64::MAX))
		.unwrap_or_default()
}
