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

//! Result delivery and the threaded matching loop

use std::{
	str::FromStr,
	sync::{
		Arc,
		atomic::{AtomicBool, Ordering},
	},
	thread,
	time::Duration,
};

use bourse_matching::{
	IngressQueue, MatchEngine, MemoryPublisher, MemoryPushProxy, MessageBody, Order, OrderCommand,
	OrderStatus, OrderType, ResultDispatcher, RetryPolicy, Side, SymbolInfo, TickQueue, TickWorker,
	engine::{EngineConfig, EngineRunner},
};
use rust_decimal::Decimal;

fn dec(s: &str) -> Decimal {
	Decimal::from_str(s).unwrap()
}

fn create_test_retry(max_attempts: u32) -> RetryPolicy {
	RetryPolicy {
		max_attempts,
		interval: Duration::ZERO,
	}
}

fn create_test_command(sequence_id: u64, side: Side, price: &str, qty: &str) -> OrderCommand {
	OrderCommand {
		order_id: format!("order_{}", sequence_id),
		sequence_id,
		uid: sequence_id,
		side,
		order_type: OrderType::Limit,
		price: dec(price),
		qty: dec(qty),
		amount: Decimal::ZERO,
		is_cancel: false,
	}
}

/// Engine wired to in-memory publisher and push proxy
fn create_test_pipeline(
	retry: RetryPolicy,
) -> (MatchEngine, MemoryPublisher, MemoryPushProxy, TickWorker) {
	let symbol = SymbolInfo::default();
	let publisher = MemoryPublisher::new();
	let proxy = MemoryPushProxy::new();

	let (producer, consumer) = TickQueue::new(10).split();
	let worker = TickWorker::start(
		consumer,
		Box::new(proxy.clone()),
		symbol.clone(),
		format!("tick@{}", symbol.symbol_name),
	)
	.unwrap();
	let dispatcher = ResultDispatcher::new(symbol.clone(), Box::new(publisher.clone()), retry, producer);

	(MatchEngine::new(symbol, Box::new(dispatcher)), publisher, proxy, worker)
}

#[test]
fn test_full_tick_queue_blocks_dispatch() {
	let symbol = SymbolInfo::default();
	let publisher = MemoryPublisher::new();
	let (producer, consumer) = TickQueue::new(1).split();
	let dispatcher = ResultDispatcher::new(
		symbol.clone(),
		Box::new(publisher.clone()),
		create_test_retry(1),
		producer,
	);
	let mut engine = MatchEngine::new(symbol, Box::new(dispatcher));

	engine.handle_order(Order::market_sell("m1", 1, 5, dec("1")));
	assert_eq!(publisher.messages().len(), 1);

	let done = Arc::new(AtomicBool::new(false));
	let flag = done.clone();
	let handle = thread::spawn(move || {
		engine.handle_order(Order::market_sell("m2", 2, 5, dec("1")));
		flag.store(true, Ordering::SeqCst);
		engine
	});

	thread::sleep(Duration::from_millis(100));
	assert!(!done.load(Ordering::SeqCst));
	assert_eq!(publisher.messages().len(), 2);

	assert_eq!(consumer.drain().len(), 1);
	let engine = handle.join().unwrap();
	assert!(done.load(Ordering::SeqCst));
	assert_eq!(engine.current_seq_id(), 2);
	assert_eq!(consumer.drain().len(), 1);
}

#[test]
fn test_publish_retries_until_success() {
	let (mut engine, publisher, _proxy, worker) = create_test_pipeline(create_test_retry(10));
	publisher.fail_next(3);

	engine.handle_order(Order::market_sell("m1", 1, 5, dec("1")));

	assert_eq!(publisher.attempts(), 4);
	let messages = publisher.messages();
	assert_eq!(messages.len(), 1);
	let MessageBody::Cancel(cancel) = &messages[0].body else {
		panic!("expected a cancel message");
	};
	assert_eq!(cancel.id, 1);
	assert_eq!(cancel.qty, dec("1"));
	assert_eq!(cancel.uid, 5);

	drop(engine);
	worker.shutdown();
}

#[test]
fn test_exhausted_retries_keep_book_mutation() {
	let (mut engine, publisher, _proxy, worker) = create_test_pipeline(create_test_retry(3));
	engine.handle_order(Order::limit("b1", 1, 1, Side::Buy, dec("100"), dec("1")));
	publisher.fail_next(usize::MAX);

	engine.handle_order(Order::limit("s1", 2, 2, Side::Sell, dec("100"), dec("1")));

	assert_eq!(publisher.attempts(), 3);
	assert!(publisher.messages().is_empty());
	assert!(engine.bids().is_empty());
	assert_eq!(engine.best_bid(), None);

	publisher.fail_next(0);
	engine.handle_order(Order::market_sell("m1", 3, 3, dec("1")));
	assert_eq!(publisher.messages().len(), 1);

	drop(engine);
	worker.shutdown();
}

#[test]
fn test_trade_message_and_ticks() {
	let (mut engine, publisher, proxy, worker) = create_test_pipeline(create_test_retry(1));
	engine.handle_order(Order::limit("s1", 1, 1, Side::Sell, dec("100"), dec("1")));
	engine.handle_order(Order::limit("s2", 2, 1, Side::Sell, dec("100.5"), dec("1")));
	engine.handle_order(Order::limit("b1", 3, 2, Side::Buy, dec("101"), dec("1.5")));

	let messages = publisher.messages();
	assert_eq!(messages.len(), 1);
	let MessageBody::MatchResult(trade) = &messages[0].body else {
		panic!("expected a trade result");
	};
	assert_eq!(trade.matched_records.len(), 2);
	assert_eq!(trade.qty, dec("1.5"));
	assert_eq!(trade.amount, dec("150.25"));
	assert_eq!(trade.low_price, dec("100"));
	assert_eq!(trade.high_price, dec("100.5"));
	assert!(trade.taker_is_buy);

	let second = &trade.matched_records[1];
	assert_eq!(second.taker.status, OrderStatus::AllFilled);
	assert_eq!(second.taker.filled_qty, dec("1.5"));
	assert_eq!(second.taker.unfrozen_amount, Some(dec("151.5")));
	assert_eq!(second.maker.status, OrderStatus::PartFilled);
	assert_eq!(second.maker.filled_qty, dec("0.5"));

	// Dropping the engine closes the tick queue; the worker flushes and exits
	drop(engine);
	worker.shutdown();

	let ticks = proxy.ticks();
	assert_eq!(ticks.len(), 2);
	assert!(proxy.topics().iter().all(|topic| topic == "tick@BTC_USDT"));
	assert_eq!(ticks[0].payload.price, "100.0000");
	assert_eq!(ticks[1].payload.price, "100.5000");
	assert_eq!(ticks[1].payload.qty, "0.5000");
	assert_eq!(ticks[1].payload.amount, "50.2500");
	assert!(ticks[0].payload.taker_is_buyer);
}

#[test]
fn test_runner_matches_queued_orders() {
	let (engine, publisher, proxy, worker) = create_test_pipeline(create_test_retry(1));
	let (sender, receiver) = IngressQueue::new(100).split();
	let runner = EngineRunner::start(engine, receiver, EngineConfig::default()).unwrap();

	sender.enqueue(create_test_command(1, Side::Sell, "100", "2")).unwrap();
	sender.enqueue(create_test_command(2, Side::Sell, "101", "1")).unwrap();
	sender.enqueue(create_test_command(3, Side::Buy, "99", "1")).unwrap();
	sender.enqueue(create_test_command(4, Side::Buy, "100", "0.5")).unwrap();

	let depth = runner.depth(5).unwrap();
	assert_eq!(depth.asks.len(), 2);
	assert_eq!(depth.asks[0].price, dec("100"));
	assert_eq!(depth.asks[0].qty, dec("1.5"));
	assert_eq!(depth.bids.len(), 1);
	assert_eq!(depth.bids[0].price, dec("99"));
	assert_eq!(depth.ask_seq_id, 4);

	let mut cancel = create_test_command(2, Side::Sell, "101", "0");
	cancel.is_cancel = true;
	sender.enqueue(cancel).unwrap();

	runner.shutdown();
	worker.shutdown();

	let messages = publisher.messages();
	assert_eq!(messages.len(), 2);
	assert!(matches!(messages[0].body, MessageBody::MatchResult(_)));
	let MessageBody::Cancel(cancel) = &messages[1].body else {
		panic!("expected a cancel message");
	};
	assert_eq!(cancel.id, 2);
	assert_eq!(cancel.qty, dec("1"));
	assert_eq!(proxy.ticks().len(), 1);
}
