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

//! Wire messages published by the matching engine
//!
//! Every broker message carries a random `message_id` so consumers can
//! de-duplicate redeliveries. Decimal figures travel as strings to keep
//! them exact across languages.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::OrderStatus;

/// State of one order leg right after a matched record was produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSnapshot {
	/// Business order id
	pub order_id: String,
	/// Sequence id of the order (arrival index)
	pub id: u64,
	/// Owning user
	pub uid: u64,
	pub filled_qty: Decimal,
	pub unfilled_qty: Decimal,
	pub filled_amount: Decimal,
	pub unfilled_amount: Decimal,
	pub status: OrderStatus,
	/// Frozen quote amount to release on the taker leg
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub unfrozen_amount: Option<Decimal>,
}

/// One maker/taker pairing inside a trade result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedRecordMessage {
	/// Trade price (always the maker's price)
	pub price: Decimal,
	pub qty: Decimal,
	pub amount: Decimal,
	pub match_sub_id: String,
	pub taker: OrderSnapshot,
	pub maker: OrderSnapshot,
}

/// Outcome of one taker sweeping the book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeResultMessage {
	pub symbol_id: u32,
	pub symbol_name: String,
	pub base_coin_id: u32,
	pub quote_coin_id: u32,
	pub match_id: String,
	pub matched_records: Vec<MatchedRecordMessage>,
	/// Price of the first matched record
	pub begin_price: Decimal,
	/// Price of the last matched record
	pub end_price: Decimal,
	pub high_price: Decimal,
	pub low_price: Decimal,
	/// Total traded quantity of the batch
	pub qty: Decimal,
	/// Total traded amount of the batch
	pub amount: Decimal,
	/// Unix timestamp in nanoseconds
	pub match_time: i64,
	pub taker_is_buy: bool,
}

/// Release of an order's unconsumed funds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelMessage {
	/// Sequence id of the released order
	pub id: u64,
	/// Quote coin for buys, base coin for sells
	pub coin_id: u32,
	/// Quote amount for buys, base quantity for sells
	pub qty: Decimal,
	pub uid: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageBody {
	MatchResult(TradeResultMessage),
	Cancel(CancelMessage),
}

/// Envelope published to the message broker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchMessage {
	pub message_id: String,
	pub body: MessageBody,
}

impl MatchMessage {
	pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
		serde_json::to_vec(self)
	}

	pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
		serde_json::from_slice(bytes)
	}
}

/// Public notification of one executed trade
///
/// Figures are pre-rendered at the instrument's display precision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tick {
	pub price: String,
	pub qty: String,
	pub amount: String,
	/// Unix timestamp in seconds
	pub timestamp: i64,
	pub taker_is_buyer: bool,
}

/// Tick addressed to a push-proxy topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickMessage {
	pub topic: String,
	pub payload: Tick,
}

impl TickMessage {
	pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
		serde_json::to_vec(self)
	}
}
