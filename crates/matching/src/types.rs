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

pub use bourse_types::{OrderStatus, OrderType, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order command received from the ingress layer
///
/// This represents an incoming request that has already been validated
/// and authorized upstream. It is either a new order or, when `is_cancel`
/// is set, a request to cancel the resting limit order identified by
/// `(price, sequence_id)` on `side`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCommand {
	/// Business order id
	pub order_id: String,
	/// Arrival index assigned upstream; also the time-priority component of the book key
	pub sequence_id: u64,
	/// Owning user
	pub uid: u64,
	pub side: Side,
	#[serde(rename = "type")]
	pub order_type: OrderType,
	/// Limit price (ignored for market orders)
	#[serde(default)]
	pub price: Decimal,
	/// Base quantity (limit orders and market sells)
	#[serde(default)]
	pub qty: Decimal,
	/// Quote amount (market buys); derived as `price * qty` for limit orders
	#[serde(default)]
	pub amount: Decimal,
	#[serde(default)]
	pub is_cancel: bool,
}

/// Internal order representation for the matching engine
///
/// Mutated in place during matching until it reaches a terminal status.
/// For limit orders `filled_qty + unfilled_qty == qty` holds at every
/// observation point; for market buys the same holds for the amounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
	pub order_id: String,
	pub sequence_id: u64,
	pub uid: u64,
	pub side: Side,
	#[serde(rename = "type")]
	pub order_type: OrderType,
	pub price: Decimal,
	/// Original quantity
	pub qty: Decimal,
	/// Original amount
	pub amount: Decimal,
	pub unfilled_qty: Decimal,
	pub unfilled_amount: Decimal,
	pub filled_qty: Decimal,
	pub filled_amount: Decimal,
	pub status: OrderStatus,
	pub is_cancel: bool,
}

impl Order {
	/// New limit order; the frozen amount is `price * qty`
	pub fn limit(
		order_id: impl Into<String>,
		sequence_id: u64,
		uid: u64,
		side: Side,
		price: Decimal,
		qty: Decimal,
	) -> Self {
		let amount = price * qty;
		Self {
			order_id: order_id.into(),
			sequence_id,
			uid,
			side,
			order_type: OrderType::Limit,
			price,
			qty,
			amount,
			unfilled_qty: qty,
			unfilled_amount: amount,
			filled_qty: Decimal::ZERO,
			filled_amount: Decimal::ZERO,
			status: OrderStatus::New,
			is_cancel: false,
		}
	}

	/// New market buy spending up to `amount` of quote currency
	pub fn market_buy(order_id: impl Into<String>, sequence_id: u64, uid: u64, amount: Decimal) -> Self {
		Self {
			order_id: order_id.into(),
			sequence_id,
			uid,
			side: Side::Buy,
			order_type: OrderType::Market,
			price: Decimal::ZERO,
			qty: Decimal::ZERO,
			amount,
			unfilled_qty: Decimal::ZERO,
			unfilled_amount: amount,
			filled_qty: Decimal::ZERO,
			filled_amount: Decimal::ZERO,
			status: OrderStatus::New,
			is_cancel: false,
		}
	}

	/// New market sell of `qty` base currency
	pub fn market_sell(order_id: impl Into<String>, sequence_id: u64, uid: u64, qty: Decimal) -> Self {
		Self {
			order_id: order_id.into(),
			sequence_id,
			uid,
			side: Side::Sell,
			order_type: OrderType::Market,
			price: Decimal::ZERO,
			qty,
			amount: Decimal::ZERO,
			unfilled_qty: qty,
			unfilled_amount: Decimal::ZERO,
			filled_qty: Decimal::ZERO,
			filled_amount: Decimal::ZERO,
			status: OrderStatus::New,
			is_cancel: false,
		}
	}

	/// Cancel request for the resting limit order keyed by `(price, sequence_id)`
	pub fn cancel_request(
		order_id: impl Into<String>,
		sequence_id: u64,
		uid: u64,
		side: Side,
		price: Decimal,
	) -> Self {
		let mut order = Self::limit(order_id, sequence_id, uid, side, price, Decimal::ZERO);
		order.is_cancel = true;
		order
	}

	/// Composite book key of this order
	pub fn key(&self) -> Key {
		Key {
			price: self.price,
			sequence_id: self.sequence_id,
		}
	}

	pub fn is_limit(&self) -> bool {
		self.order_type == OrderType::Limit
	}

	pub fn is_market(&self) -> bool {
		self.order_type == OrderType::Market
	}
}

impl From<OrderCommand> for Order {
	fn from(cmd: OrderCommand) -> Self {
		match (cmd.order_type, cmd.side) {
			_ if cmd.is_cancel => {
				Order::cancel_request(cmd.order_id, cmd.sequence_id, cmd.uid, cmd.side, cmd.price)
			}
			(OrderType::Limit, side) => {
				Order::limit(cmd.order_id, cmd.sequence_id, cmd.uid, side, cmd.price, cmd.qty)
			}
			(OrderType::Market, Side::Buy) => {
				Order::market_buy(cmd.order_id, cmd.sequence_id, cmd.uid, cmd.amount)
			}
			(OrderType::Market, Side::Sell) => {
				Order::market_sell(cmd.order_id, cmd.sequence_id, cmd.uid, cmd.qty)
			}
		}
	}
}

/// Composite ordering key `(price, sequence_id)` of a resting order
///
/// The side-specific ordering (ascending price for asks, descending for
/// bids, ties by ascending sequence id) is applied by the owning book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
	pub price: Decimal,
	pub sequence_id: u64,
}

impl Key {
	pub fn new(price: Decimal, sequence_id: u64) -> Self {
		Self { price, sequence_id }
	}
}

/// One maker/taker pairing produced during a single matching pass
///
/// `taker` and `maker` are value copies taken when the record was built,
/// so later engine mutation never changes an already emitted record.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedRecord {
	/// Trade price (always the maker's price)
	pub price: Decimal,
	pub qty: Decimal,
	pub amount: Decimal,
	pub record_id: String,
	pub taker: Order,
	pub maker: Order,
}

/// Ordered batch of matched records with aggregate figures
#[derive(Debug, Clone, PartialEq)]
pub struct TradeBatch {
	pub records: Vec<MatchedRecord>,
	/// Total traded quantity
	pub qty: Decimal,
	/// Total traded amount
	pub amount: Decimal,
	pub begin_price: Decimal,
	pub end_price: Decimal,
	pub high_price: Decimal,
	pub low_price: Decimal,
}

impl TradeBatch {
	/// Aggregate a non-empty record sequence; returns `None` when empty
	///
	/// Makers are consumed in priority order, so the first and last record
	/// bound the batch: ascending prices for a buy taker, descending for a
	/// sell taker.
	pub fn new(records: Vec<MatchedRecord>, taker_is_buy: bool) -> Option<Self> {
		let begin_price = records.first()?.price;
		let end_price = records.last()?.price;
		let (low_price, high_price) = if taker_is_buy {
			(begin_price, end_price)
		} else {
			(end_price, begin_price)
		};
		let qty = records.iter().map(|r| r.qty).sum();
		let amount = records.iter().map(|r| r.amount).sum();

		Some(Self {
			records,
			qty,
			amount,
			begin_price,
			end_price,
			high_price,
			low_price,
		})
	}
}

/// Release of an order's unconsumed funds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelResult {
	/// Sequence id of the cancelled (or unconsumed-remainder) order
	pub sequence_id: u64,
	/// Currency released: quote for buys, base for sells
	pub coin_id: u32,
	/// Quote amount for buys, base quantity for sells
	pub qty: Decimal,
	pub uid: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatchPayload {
	Trades(TradeBatch),
	Cancel(CancelResult),
}

/// Outcome of processing one inbound order
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
	pub match_id: String,
	/// Unix timestamp in nanoseconds
	pub match_time: i64,
	pub taker_is_buy: bool,
	pub payload: MatchPayload,
}

impl MatchResult {
	pub fn trades(&self) -> Option<&TradeBatch> {
		match &self.payload {
			MatchPayload::Trades(batch) => Some(batch),
			MatchPayload::Cancel(_) => None,
		}
	}

	pub fn cancel(&self) -> Option<&CancelResult> {
		match &self.payload {
			MatchPayload::Cancel(cancel) => Some(cancel),
			MatchPayload::Trades(_) => None,
		}
	}
}

/// Depth delta at one price level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
	pub price: Decimal,
	pub qty: Decimal,
}

impl Position {
	pub fn new(price: Decimal, qty: Decimal) -> Self {
		Self { price, qty }
	}
}

/// Direction of a depth delta
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthOp {
	/// Increase the level, creating it if absent
	Add,
	/// Decrease the level, removing it when it reaches zero
	Delete,
}

/// Static description of the traded instrument
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolInfo {
	pub symbol_id: u32,
	pub symbol_name: String,
	pub base_coin_id: u32,
	pub base_coin_name: String,
	pub quote_coin_id: u32,
	pub quote_coin_name: String,
	/// Decimal places of the base currency
	pub base_coin_prec: u32,
	/// Decimal places of the quote currency
	pub quote_coin_prec: u32,
}

impl SymbolInfo {
	/// Smallest tradable base quantity, `10^-base_coin_prec`
	pub fn base_min_unit(&self) -> Decimal {
		Decimal::new(1, self.base_coin_prec)
	}

	/// Currency released when an order on `side` gives funds back
	pub fn release_coin(&self, side: Side) -> u32 {
		match side {
			Side::Buy => self.quote_coin_id,
			Side::Sell => self.base_coin_id,
		}
	}
}

impl Default for SymbolInfo {
	fn default() -> Self {
		Self {
			symbol_id: 1,
			symbol_name: "BTC_USDT".to_string(),
			base_coin_id: 1,
			base_coin_name: "BTC".to_string(),
			quote_coin_id: 2,
			quote_coin_name: "USDT".to_string(),
			base_coin_prec: 4,
			quote_coin_prec: 4,
		}
	}
}
