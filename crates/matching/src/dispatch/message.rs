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

//! Conversion of engine results into broker messages

use bourse_types::{
	CancelMessage, MatchMessage, MatchedRecordMessage, MessageBody, OrderSnapshot,
	TradeResultMessage,
};
use rust_decimal::Decimal;

use crate::types::{CancelResult, MatchPayload, MatchResult, Order, SymbolInfo, TradeBatch};

/// Build the broker envelope for `result` under a fresh message id
pub fn build_message(symbol: &SymbolInfo, result: &MatchResult) -> MatchMessage {
	let body = match &result.payload {
		MatchPayload::Trades(batch) => MessageBody::MatchResult(trade_message(symbol, result, batch)),
		MatchPayload::Cancel(cancel) => MessageBody::Cancel(cancel_message(cancel)),
	};
	MatchMessage {
		message_id: uuid::Uuid::new_v4().simple().to_string(),
		body,
	}
}

fn trade_message(symbol: &SymbolInfo, result: &MatchResult, batch: &TradeBatch) -> TradeResultMessage {
	// Running release of the limit taker's frozen quote, at the taker's price
	let mut unfrozen = Decimal::ZERO;

	let matched_records = batch
		.records
		.iter()
		.map(|record| {
			let taker = &record.taker;
			let taker_unfrozen = if taker.is_limit() {
				unfrozen += record.qty * taker.price;
				unfrozen
			} else {
				taker.filled_amount
			};
			let taker_filled_qty = if taker.is_limit() {
				taker.qty - taker.unfilled_qty
			} else {
				taker.filled_qty
			};
			let maker = &record.maker;

			MatchedRecordMessage {
				price: record.price,
				qty: record.qty,
				amount: record.amount,
				match_sub_id: record.record_id.clone(),
				taker: snapshot(taker, taker_filled_qty, Some(taker_unfrozen)),
				maker: snapshot(maker, maker.qty - maker.unfilled_qty, None),
			}
		})
		.collect();

	TradeResultMessage {
		symbol_id: symbol.symbol_id,
		symbol_name: symbol.symbol_name.clone(),
		base_coin_id: symbol.base_coin_id,
		quote_coin_id: symbol.quote_coin_id,
		match_id: result.match_id.clone(),
		matched_records,
		begin_price: batch.begin_price,
		end_price: batch.end_price,
		high_price: batch.high_price,
		low_price: batch.low_price,
		qty: batch.qty,
		amount: batch.amount,
		match_time: result.match_time,
		taker_is_buy: result.taker_is_buy,
	}
}

fn snapshot(order: &Order, filled_qty: Decimal, unfrozen_amount: Option<Decimal>) -> OrderSnapshot {
	OrderSnapshot {
		order_id: order.order_id.clone(),
		id: order.sequence_id,
		uid: order.uid,
		filled_qty,
		unfilled_qty: order.unfilled_qty,
		filled_amount: order.filled_amount,
		unfilled_amount: order.unfilled_amount,
		status: order.status,
		unfrozen_amount,
	}
}

fn cancel_message(cancel: &CancelResult) -> CancelMessage {
	CancelMessage {
		id: cancel.sequence_id,
		coin_id: cancel.coin_id,
		qty: cancel.qty,
		uid: cancel.uid,
	}
}
