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

use std::{
	sync::{
		Arc,
		atomic::{AtomicBool, Ordering},
	},
	thread::{self, JoinHandle},
	time::Duration,
};

use bourse_types::{Tick, TickMessage};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, error, info, warn};

use super::{DispatchError, PushProxy, TickConsumer, TickQueueError};
use crate::types::{MatchResult, SymbolInfo};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Render every matched record of `result` as a tick on `topic`
///
/// Cancel results carry no records and yield nothing.
pub fn ticks_for(symbol: &SymbolInfo, topic: &str, result: &MatchResult) -> Vec<TickMessage> {
	let Some(batch) = result.trades() else {
		return Vec::new();
	};
	let timestamp = result.match_time / 1_000_000_000;

	batch
		.records
		.iter()
		.map(|record| TickMessage {
			topic: topic.to_string(),
			payload: Tick {
				price: fixed(record.price, symbol.quote_coin_prec),
				qty: fixed(record.qty, symbol.base_coin_prec),
				amount: fixed(record.amount, symbol.quote_coin_prec),
				timestamp,
				taker_is_buyer: result.taker_is_buy,
			},
		})
		.collect()
}

/// Banker's rounding to `prec` places, zero padded
fn fixed(value: Decimal, prec: u32) -> String {
	let mut rounded = value.round_dp_with_strategy(prec, RoundingStrategy::MidpointNearestEven);
	rounded.rescale(prec);
	rounded.to_string()
}

/// Tick worker - fans trade results out to the push proxy
///
/// Runs on its own thread so slow pushes never stall matching beyond the
/// tick queue's capacity. Push failures are logged and the tick dropped.
pub struct TickWorker {
	thread_handle: Option<JoinHandle<()>>,
	shutdown: Arc<AtomicBool>,
}

impl TickWorker {
	/// Start the worker; ticks are published on `topic`
	pub fn start(
		consumer: TickConsumer,
		proxy: Box<dyn PushProxy>,
		symbol: SymbolInfo,
		topic: String,
	) -> Result<Self, DispatchError> {
		let shutdown = Arc::new(AtomicBool::new(false));
		let shutdown_clone = shutdown.clone();

		let thread_handle = thread::Builder::new()
			.name("tick-worker".to_string())
			.spawn(move || {
				info!(target: "tick_worker", topic = %topic, "Tick worker started");
				Self::run_tick_loop(&consumer, proxy.as_ref(), &symbol, &topic, &shutdown_clone);
				info!(target: "tick_worker", "Tick worker stopped");
			})?;

		Ok(Self {
			thread_handle: Some(thread_handle),
			shutdown,
		})
	}

	fn run_tick_loop(
		consumer: &TickConsumer,
		proxy: &dyn PushProxy,
		symbol: &SymbolInfo,
		topic: &str,
		shutdown: &Arc<AtomicBool>,
	) {
		loop {
			if shutdown.load(Ordering::Relaxed) {
				let remaining = consumer.drain();
				if !remaining.is_empty() {
					info!(
						target: "tick_worker",
						pending = remaining.len(),
						"Flushing ticks during shutdown"
					);
				}
				for result in &remaining {
					Self::push_ticks(proxy, symbol, topic, result);
				}
				break;
			}

			match consumer.recv_timeout(POLL_INTERVAL) {
				Ok(Some(result)) => Self::push_ticks(proxy, symbol, topic, &result),
				Ok(None) => continue,
				Err(TickQueueError::Disconnected) => {
					for result in consumer.drain() {
						Self::push_ticks(proxy, symbol, topic, &result);
					}
					debug!(target: "tick_worker", "Tick queue disconnected");
					break;
				}
				Err(TickQueueError::Empty) => continue,
			}
		}
	}

	fn push_ticks(proxy: &dyn PushProxy, symbol: &SymbolInfo, topic: &str, result: &MatchResult) {
		for tick in ticks_for(symbol, topic, result) {
			let payload = match tick.to_bytes() {
				Ok(payload) => payload,
				Err(e) => {
					error!(target: "tick_worker", error = %e, "Failed to encode tick");
					continue;
				}
			};
			if let Err(e) = proxy.push(topic, &payload) {
				error!(target: "tick_worker", topic = %topic, error = %e, "Push tick failed");
			}
		}
	}

	/// Flush queued results and stop the worker
	pub fn shutdown(mut self) {
		info!(target: "tick_worker", "Shutting down tick worker");
		self.stop();
	}

	fn stop(&mut self) {
		self.shutdown.store(true, Ordering::Relaxed);
		if let Some(handle) = self.thread_handle.take()
			&& let Err(e) = handle.join()
		{
			warn!(target: "tick_worker", error = ?e, "Tick worker thread panicked");
		}
	}
}

impl Drop for TickWorker {
	fn drop(&mut self) {
		self.stop();
	}
}
