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

//! Matching behavior through the public engine API

use std::{
	str::FromStr,
	sync::{Arc, Mutex},
};

use bourse_matching::{
	HandleOutcome, Key, MatchEngine, MatchResult, Order, OrderStatus, RejectReason, ResultSink,
	Side, SymbolInfo,
};
use rust_decimal::Decimal;

#[derive(Clone, Default)]
struct RecordingSink {
	results: Arc<Mutex<Vec<MatchResult>>>,
}

impl ResultSink for RecordingSink {
	fn send_match_result(&mut self, result: MatchResult) {
		self.results.lock().unwrap().push(result);
	}
}

fn dec(s: &str) -> Decimal {
	Decimal::from_str(s).unwrap()
}

fn create_test_engine() -> (MatchEngine, Arc<Mutex<Vec<MatchResult>>>) {
	let sink = RecordingSink::default();
	let results = sink.results.clone();
	(MatchEngine::new(SymbolInfo::default(), Box::new(sink)), results)
}

fn accepted(outcome: HandleOutcome) -> Order {
	match outcome {
		HandleOutcome::Accepted(order) => order,
		HandleOutcome::Rejected(reason) => panic!("order rejected: {:?}", reason),
	}
}

#[test]
fn test_scenario_resting_ask_shows_in_depth() {
	let (mut engine, results) = create_test_engine();

	let order = accepted(engine.handle_order(Order::limit("s1", 1, 1, Side::Sell, dec("100"), dec("1"))));

	assert_eq!(order.status, OrderStatus::New);
	assert_eq!(engine.asks().len(), 1);
	assert_eq!(engine.best_ask(), Some(dec("100")));

	let depth = engine.get_depth(1);
	assert_eq!(depth.asks.len(), 1);
	assert_eq!(depth.asks[0].price, dec("100"));
	assert_eq!(depth.asks[0].qty, dec("1"));
	assert!(depth.bids.is_empty());
	assert!(results.lock().unwrap().is_empty());
}

#[test]
fn test_scenario_partial_fill_of_resting_ask() {
	let (mut engine, results) = create_test_engine();
	engine.handle_order(Order::limit("s1", 1, 1, Side::Sell, dec("100"), dec("1")));

	let buyer = accepted(engine.handle_order(Order::limit("b1", 2, 2, Side::Buy, dec("100"), dec("0.5"))));

	assert_eq!(buyer.status, OrderStatus::AllFilled);
	assert_eq!(buyer.filled_qty, dec("0.5"));
	assert_eq!(buyer.filled_amount, dec("50"));

	let seller = engine.resting(Side::Sell, &Key::new(dec("100"), 1)).unwrap();
	assert_eq!(seller.status, OrderStatus::PartFilled);
	assert_eq!(seller.filled_qty, dec("0.5"));
	assert_eq!(seller.filled_amount, dec("50"));
	assert_eq!(seller.unfilled_qty, dec("0.5"));

	let depth = engine.get_depth(5);
	assert_eq!(depth.asks[0].qty, dec("0.5"));
	assert!(engine.bids().is_empty());

	let results = results.lock().unwrap();
	assert_eq!(results.len(), 1);
	let batch = results[0].trades().unwrap();
	assert_eq!(batch.records.len(), 1);
	assert_eq!(batch.records[0].price, dec("100"));
	assert_eq!(batch.records[0].maker.status, OrderStatus::PartFilled);
	assert_eq!(batch.records[0].taker.status, OrderStatus::AllFilled);
	assert!(results[0].taker_is_buy);
}

#[test]
fn test_scenario_market_sell_on_empty_bids() {
	let (mut engine, results) = create_test_engine();

	let order = accepted(engine.handle_order(Order::market_sell("m1", 1, 7, dec("1"))));

	assert_eq!(order.status, OrderStatus::Cancelled);
	let results = results.lock().unwrap();
	assert_eq!(results.len(), 1);
	assert!(results[0].trades().is_none());
	let cancel = results[0].cancel().unwrap();
	assert_eq!(cancel.qty, dec("1"));
	assert_eq!(cancel.coin_id, engine.symbol().base_coin_id);
	assert_eq!(cancel.uid, 7);
}

#[test]
fn test_scenario_market_buy_takes_whole_ask() {
	let (mut engine, results) = create_test_engine();
	engine.handle_order(Order::limit("s1", 1, 1, Side::Sell, dec("100"), dec("1")));

	let buyer = accepted(engine.handle_order(Order::market_buy("m1", 2, 2, dec("100"))));

	assert_eq!(buyer.status, OrderStatus::AllFilled);
	assert_eq!(buyer.filled_qty, dec("1"));
	assert_eq!(buyer.filled_amount, dec("100"));
	assert!(engine.asks().is_empty());
	assert_eq!(engine.best_ask(), None);
	assert!(engine.get_depth(5).asks.is_empty());

	let results = results.lock().unwrap();
	assert_eq!(results.len(), 1);
	let maker = &results[0].trades().unwrap().records[0].maker;
	assert_eq!(maker.status, OrderStatus::AllFilled);
	assert_eq!(maker.filled_qty, dec("1"));
}

#[test]
fn test_scenario_cancel_of_absent_key() {
	let (mut engine, results) = create_test_engine();
	engine.handle_order(Order::limit("s1", 1, 1, Side::Sell, dec("100"), dec("1")));
	let before = engine.get_depth(5);

	let outcome = engine.handle_order(Order::cancel_request("s1", 1, 1, Side::Sell, dec("101")));

	assert_eq!(outcome, HandleOutcome::Rejected(RejectReason::NotFound));
	assert_eq!(engine.asks().len(), 1);
	assert_eq!(engine.get_depth(5).asks, before.asks);
	assert!(results.lock().unwrap().is_empty());
}

#[test]
fn test_limit_buy_sweeps_levels_then_rests() {
	let (mut engine, results) = create_test_engine();
	engine.handle_order(Order::limit("s1", 1, 1, Side::Sell, dec("100"), dec("1")));
	engine.handle_order(Order::limit("s2", 2, 1, Side::Sell, dec("100"), dec("1")));
	engine.handle_order(Order::limit("s3", 3, 1, Side::Sell, dec("102"), dec("1")));

	let buyer = accepted(engine.handle_order(Order::limit("b1", 4, 2, Side::Buy, dec("101"), dec("3"))));

	assert_eq!(buyer.status, OrderStatus::PartFilled);
	assert_eq!(engine.best_bid(), Some(dec("101")));
	assert_eq!(engine.best_ask(), Some(dec("102")));

	let results = results.lock().unwrap();
	let batch = results[0].trades().unwrap();
	let makers: Vec<&str> = batch.records.iter().map(|r| r.maker.order_id.as_str()).collect();
	assert_eq!(makers, vec!["s1", "s2"]);
	assert_eq!(batch.qty, dec("2"));
	assert_eq!(batch.amount, dec("200"));

	let depth = engine.get_depth(5);
	assert_eq!(depth.bids[0].price, dec("101"));
	assert_eq!(depth.bids[0].qty, dec("1"));
	assert_eq!(depth.asks.len(), 1);
}

#[test]
fn test_sell_taker_batch_prices() {
	let (mut engine, results) = create_test_engine();
	engine.handle_order(Order::limit("b1", 1, 1, Side::Buy, dec("101"), dec("1")));
	engine.handle_order(Order::limit("b2", 2, 1, Side::Buy, dec("99"), dec("1")));

	engine.handle_order(Order::limit("s1", 3, 2, Side::Sell, dec("98"), dec("2")));

	let results = results.lock().unwrap();
	let batch = results[0].trades().unwrap();
	assert_eq!(batch.begin_price, dec("101"));
	assert_eq!(batch.end_price, dec("99"));
	assert_eq!(batch.high_price, dec("101"));
	assert_eq!(batch.low_price, dec("99"));
	assert!(!results[0].taker_is_buy);
}

#[test]
fn test_cancel_after_partial_fill_releases_remainder() {
	let (mut engine, results) = create_test_engine();
	engine.handle_order(Order::limit("s1", 1, 9, Side::Sell, dec("100"), dec("2")));
	engine.handle_order(Order::limit("b1", 2, 2, Side::Buy, dec("100"), dec("0.5")));

	let cancelled = accepted(engine.handle_order(Order::cancel_request("s1", 1, 9, Side::Sell, dec("100"))));

	assert_eq!(cancelled.status, OrderStatus::Cancelled);
	assert_eq!(cancelled.filled_qty, dec("0.5"));
	assert!(engine.asks().is_empty());
	assert_eq!(engine.get_depth(5).asks.len(), 0);

	let results = results.lock().unwrap();
	let cancel = results[1].cancel().unwrap();
	assert_eq!(cancel.qty, dec("1.5"));
	assert_eq!(cancel.coin_id, engine.symbol().base_coin_id);
	assert_eq!(cancel.uid, 9);
}

#[test]
fn test_market_buy_remainder_cancelled() {
	let (mut engine, results) = create_test_engine();
	engine.handle_order(Order::limit("s1", 1, 1, Side::Sell, dec("100"), dec("1")));

	let buyer = accepted(engine.handle_order(Order::market_buy("m1", 2, 2, dec("250"))));

	assert_eq!(buyer.status, OrderStatus::PartFilled);
	assert_eq!(buyer.unfilled_amount, dec("150"));

	let results = results.lock().unwrap();
	assert_eq!(results.len(), 2);
	assert!(results[0].trades().is_some());
	let cancel = results[1].cancel().unwrap();
	assert_eq!(cancel.qty, dec("150"));
	assert_eq!(cancel.coin_id, engine.symbol().quote_coin_id);
}

#[test]
fn test_market_buy_too_small_only_cancels() {
	let (mut engine, results) = create_test_engine();
	engine.handle_order(Order::limit("s1", 1, 1, Side::Sell, dec("100"), dec("1")));

	let buyer = accepted(engine.handle_order(Order::market_buy("m1", 2, 2, dec("0.001"))));

	assert_eq!(buyer.status, OrderStatus::Cancelled);
	let results = results.lock().unwrap();
	assert_eq!(results.len(), 1);
	assert_eq!(results[0].cancel().unwrap().qty, dec("0.001"));
	assert_eq!(engine.asks().best().unwrap().status, OrderStatus::New);
}

#[test]
fn test_market_buy_remainder_never_negative() {
	let (mut engine, results) = create_test_engine();
	engine.handle_order(Order::limit("s1", 1, 1, Side::Sell, dec("7"), dec("2")));

	let buyer = accepted(engine.handle_order(Order::market_buy(
		"m1",
		2,
		2,
		dec("6.9999999999999999999999999999"),
	)));

	assert_eq!(buyer.filled_amount, dec("6.9993"));
	assert!(buyer.unfilled_amount >= Decimal::ZERO);

	let results = results.lock().unwrap();
	assert_eq!(results.len(), 2);
	assert_eq!(results[0].trades().unwrap().amount, dec("6.9993"));
	let cancel = results[1].cancel().unwrap();
	assert!(cancel.qty >= Decimal::ZERO);
	assert_eq!(cancel.qty, dec("0.0006999999999999999999999999"));
	assert_eq!(engine.asks().best().unwrap().unfilled_qty, dec("1.0001"));
}

#[test]
fn test_recorded_maker_is_not_aliased() {
	let (mut engine, results) = create_test_engine();
	engine.handle_order(Order::limit("s1", 1, 1, Side::Sell, dec("100"), dec("3")));
	engine.handle_order(Order::limit("b1", 2, 2, Side::Buy, dec("100"), dec("1")));
	engine.handle_order(Order::limit("b2", 3, 2, Side::Buy, dec("100"), dec("1")));

	let results = results.lock().unwrap();
	let first = &results[0].trades().unwrap().records[0].maker;
	let second = &results[1].trades().unwrap().records[0].maker;
	assert_eq!(first.unfilled_qty, dec("2"));
	assert_eq!(second.unfilled_qty, dec("1"));
}

/// Deterministic pseudo-random order stream
struct OrderStream {
	state: u64,
	next_seq: u64,
	live: Vec<(Side, Decimal, u64)>,
}

impl OrderStream {
	fn new(seed: u64) -> Self {
		Self {
			state: seed,
			next_seq: 1,
			live: Vec::new(),
		}
	}

	fn next_u64(&mut self) -> u64 {
		self.state = self
			.state
			.wrapping_mul(6364136223846793005)
			.wrapping_add(1442695040888963407);
		self.state >> 33
	}

	fn next_order(&mut self) -> Order {
		let seq = self.next_seq;
		self.next_seq += 1;
		let side = if self.next_u64().is_multiple_of(2) { Side::Buy } else { Side::Sell };
		let roll = self.next_u64() % 20;

		if roll == 0 && !self.live.is_empty() {
			let index = (self.next_u64() as usize) % self.live.len();
			let (side, price, seq) = self.live.swap_remove(index);
			return Order::cancel_request(format!("o{}", seq), seq, 1, side, price);
		}
		if roll == 1 {
			return Order::market_sell(format!("o{}", seq), seq, 1, Decimal::new(self.next_u64() as i64 % 500 + 1, 2));
		}
		if roll == 2 {
			return Order::market_buy(format!("o{}", seq), seq, 1, Decimal::new(self.next_u64() as i64 % 50_000 + 1, 2));
		}

		let price = Decimal::from(95 + self.next_u64() % 11);
		let qty = Decimal::new(self.next_u64() as i64 % 300 + 1, 2);
		self.live.push((side, price, seq));
		Order::limit(format!("o{}", seq), seq, 1, side, price, qty)
	}
}

fn assert_book_invariants(engine: &MatchEngine) {
	if let (Some(bid), Some(ask)) = (engine.best_bid(), engine.best_ask()) {
		assert!(bid < ask, "crossed book: bid {} >= ask {}", bid, ask);
	}
	assert_eq!(engine.best_bid(), engine.bids().best_price());
	assert_eq!(engine.best_ask(), engine.asks().best_price());

	let asks: Vec<&Order> = engine.asks().iter().collect();
	for pair in asks.windows(2) {
		let ordered = pair[0].price < pair[1].price
			|| (pair[0].price == pair[1].price && pair[0].sequence_id < pair[1].sequence_id);
		assert!(ordered, "ask priority violated");
	}
	let bids: Vec<&Order> = engine.bids().iter().collect();
	for pair in bids.windows(2) {
		let ordered = pair[0].price > pair[1].price
			|| (pair[0].price == pair[1].price && pair[0].sequence_id < pair[1].sequence_id);
		assert!(ordered, "bid priority violated");
	}

	for (side, book) in [(Side::Buy, engine.bids()), (Side::Sell, engine.asks())] {
		for order in book.iter() {
			assert!(order.status.is_resting(), "{:?} resting with {:?}", order.order_id, order.status);
			assert!(order.unfilled_qty > Decimal::ZERO);
			assert_eq!(order.filled_qty + order.unfilled_qty, order.qty);
		}

		let mut levels = std::collections::BTreeMap::new();
		for order in book.iter() {
			*levels.entry(order.price).or_insert(Decimal::ZERO) += order.unfilled_qty;
		}
		assert_eq!(engine.depth().level_count(side), levels.len());
		for (price, qty) in levels {
			assert_eq!(engine.depth().level_qty(side, price), Some(qty));
		}
	}
}

#[test]
fn test_random_stream_preserves_book_invariants() {
	let (mut engine, results) = create_test_engine();
	let mut stream = OrderStream::new(42);

	for _ in 0..2_000 {
		let order = stream.next_order();
		let is_limit = order.is_limit() && !order.is_cancel;
		if let HandleOutcome::Accepted(order) = engine.handle_order(order)
			&& is_limit
		{
			assert_eq!(order.filled_qty + order.unfilled_qty, order.qty);
		}
		assert_book_invariants(&engine);
	}

	for result in results.lock().unwrap().iter() {
		let Some(batch) = result.trades() else {
			continue;
		};
		for record in &batch.records {
			if record.maker.is_limit() {
				assert_eq!(record.maker.filled_qty + record.maker.unfilled_qty, record.maker.qty);
			}
			assert_eq!(record.amount, record.qty * record.price);
		}
	}
}
