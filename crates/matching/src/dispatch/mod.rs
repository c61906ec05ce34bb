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

//! Delivery of match results to the outside world
//!
//! Every result is serialized and published to the message broker with a
//! bounded retry, then handed to the tick worker which turns trade records
//! into public ticks on the push proxy.

mod buffer;
mod memory;
mod message;
mod tick;

pub use buffer::{TickConsumer, TickProducer, TickQueue, TickQueueError};
pub use memory::{JsonLinesPublisher, LogPushProxy, MemoryPublisher, MemoryPushProxy};
pub use message::build_message;
pub use tick::{TickWorker, ticks_for};

use std::{thread, time::Duration};

use thiserror::Error;
use tracing::{debug, error, warn};

use crate::{
	engine::ResultSink,
	types::{MatchResult, SymbolInfo},
};

/// Error types for result delivery
#[derive(Debug, Error)]
pub enum DispatchError {
	#[error("Failed to encode message: {0}")]
	Encode(#[from] serde_json::Error),
	#[error("Publish failed: {0}")]
	Publish(String),
	#[error("Push failed: {0}")]
	Push(String),
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}

/// Message broker client
pub trait MessagePublisher: Send {
	fn publish(&mut self, payload: &[u8]) -> Result<(), DispatchError>;
}

/// Public tick fan-out service
pub trait PushProxy: Send {
	fn push(&self, topic: &str, payload: &[u8]) -> Result<(), DispatchError>;
}

/// Publish retry schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
	/// Total attempts, the first one included
	pub max_attempts: u32,
	/// Pause between consecutive attempts
	pub interval: Duration,
}

impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_attempts: 10,
			interval: Duration::from_secs(1),
		}
	}
}

/// Result sink publishing to the broker and feeding the tick worker
///
/// Runs on the matching thread: publishing retries block matching, and so
/// does a full tick queue. Broker output stays in engine order.
pub struct ResultDispatcher {
	symbol: SymbolInfo,
	publisher: Box<dyn MessagePublisher>,
	retry: RetryPolicy,
	ticks: TickProducer,
}

impl ResultDispatcher {
	pub fn new(
		symbol: SymbolInfo,
		publisher: Box<dyn MessagePublisher>,
		retry: RetryPolicy,
		ticks: TickProducer,
	) -> Self {
		Self {
			symbol,
			publisher,
			retry,
			ticks,
		}
	}

	fn publish_with_retry(&mut self, payload: &[u8]) -> Result<(), DispatchError> {
		let max_attempts = self.retry.max_attempts.max(1);
		let mut attempt = 1;
		loop {
			match self.publisher.publish(payload) {
				Ok(()) => return Ok(()),
				Err(e) if attempt < max_attempts => {
					error!(
						target: "dispatch",
						attempt,
						max_attempts,
						error = %e,
						"Send message failed, retrying"
					);
					attempt += 1;
					thread::sleep(self.retry.interval);
				}
				Err(e) => return Err(e),
			}
		}
	}
}

impl ResultSink for ResultDispatcher {
	fn send_match_result(&mut self, result: MatchResult) {
		let message = build_message(&self.symbol, &result);
		match message.to_bytes() {
			Ok(payload) => {
				if let Err(e) = self.publish_with_retry(&payload) {
					error!(
						target: "dispatch",
						message_id = %message.message_id,
						match_id = %result.match_id,
						severity = "critical",
						attempts = self.retry.max_attempts.max(1),
						error = %e,
						"Giving up on match result after exhausting retries"
					);
				} else {
					debug!(target: "dispatch", message_id = %message.message_id, "Match result published");
				}
			}
			Err(e) => {
				error!(target: "dispatch", match_id = %result.match_id, error = %e, "Failed to encode match result");
			}
		}

		if self.ticks.push(result).is_err() {
			warn!(target: "dispatch", "Tick worker is gone, dropping ticks");
		}
	}
}
