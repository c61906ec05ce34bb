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

use std::thread::{self, JoinHandle};

use crossbeam::channel::{Receiver, Sender, select, unbounded};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::{EngineControlMessage, EngineError, MatchEngine};
use crate::{
	depth::DepthData,
	queue::QueueReceiver,
	types::{Order, OrderCommand},
};

/// Configuration for the matching loop
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
	/// Log every dequeued command at debug level
	pub verbose_logging: bool,
}

/// Runs a [`MatchEngine`] on a dedicated thread
///
/// The thread owns the engine outright. Orders arrive through the ingress
/// queue, reads and shutdown through the control channel; nothing else
/// touches the book, so no locking is involved.
pub struct EngineRunner {
	thread_handle: Option<JoinHandle<()>>,
	control: Sender<EngineControlMessage>,
}

impl EngineRunner {
	/// Spawn the matching loop
	pub fn start(
		engine: MatchEngine,
		queue_receiver: QueueReceiver,
		config: EngineConfig,
	) -> Result<Self, EngineError> {
		let (control, control_rx) = unbounded();

		let thread_handle = thread::Builder::new()
			.name("matching-loop".to_string())
			.spawn(move || {
				let mut engine = engine;
				info!(
					target: "engine",
					symbol = %engine.symbol().symbol_name,
					"Matching loop started"
				);
				Self::run_matching_loop(&mut engine, &queue_receiver, &control_rx, &config);
				info!(target: "engine", "Matching loop stopped");
			})?;

		Ok(Self {
			thread_handle: Some(thread_handle),
			control,
		})
	}

	fn run_matching_loop(
		engine: &mut MatchEngine,
		queue_receiver: &QueueReceiver,
		control_rx: &Receiver<EngineControlMessage>,
		config: &EngineConfig,
	) {
		let orders = queue_receiver.receiver();
		loop {
			select! {
				recv(orders) -> cmd => match cmd {
					Ok(cmd) => Self::process(engine, cmd, config),
					Err(_) => {
						info!(target: "engine", "Ingress queue disconnected");
						break;
					}
				},
				recv(control_rx) -> msg => match msg {
					Ok(EngineControlMessage::GetDepth { level, respond_to }) => {
						Self::drain(engine, queue_receiver, config, queue_receiver.len());
						if respond_to.send(engine.get_depth(level)).is_err() {
							debug!(target: "engine", "Depth requester went away");
						}
					}
					Ok(EngineControlMessage::Shutdown) | Err(_) => {
						let drained = Self::drain(engine, queue_receiver, config, usize::MAX);
						info!(target: "engine", drained, "Shutdown requested");
						break;
					}
				},
			}
		}
	}

	/// Match at most `max` queued commands without blocking
	fn drain(
		engine: &mut MatchEngine,
		queue_receiver: &QueueReceiver,
		config: &EngineConfig,
		max: usize,
	) -> usize {
		let mut drained = 0;
		while drained < max {
			let Ok(cmd) = queue_receiver.try_recv() else {
				break;
			};
			Self::process(engine, cmd, config);
			drained += 1;
		}
		drained
	}

	fn process(engine: &mut MatchEngine, cmd: OrderCommand, config: &EngineConfig) {
		if config.verbose_logging {
			debug!(
				target: "engine",
				"Processing order: {} {:?} {:?} {} @ {} cancel={}",
				cmd.order_id, cmd.side, cmd.order_type, cmd.qty, cmd.price, cmd.is_cancel
			);
		}
		let order: Order = cmd.into();
		engine.handle_order(order);
	}

	/// Current depth, read on the matching thread (blocking)
	///
	/// Must not be called from within an async context; use
	/// [`depth_async`](Self::depth_async) there.
	pub fn depth(&self, level: i32) -> Result<DepthData, EngineError> {
		let rx = self.request_depth(level)?;
		rx.blocking_recv().map_err(|_| EngineError::ControlChannelClosed)
	}

	/// Current depth, read on the matching thread
	pub async fn depth_async(&self, level: i32) -> Result<DepthData, EngineError> {
		let rx = self.request_depth(level)?;
		rx.await.map_err(|_| EngineError::ControlChannelClosed)
	}

	fn request_depth(&self, level: i32) -> Result<oneshot::Receiver<DepthData>, EngineError> {
		let (respond_to, rx) = oneshot::channel();
		self.control
			.send(EngineControlMessage::GetDepth { level, respond_to })
			.map_err(|_| EngineError::Shutdown)?;
		Ok(rx)
	}

	/// Process everything already queued, then stop the loop and join it
	pub fn shutdown(mut self) {
		info!(target: "engine", "Shutting down matching engine");
		self.stop();
	}

	fn stop(&mut self) {
		let _ = self.control.send(EngineControlMessage::Shutdown);
		if let Some(handle) = self.thread_handle.take()
			&& let Err(e) = handle.join()
		{
			warn!(target: "engine", error = ?e, "Matching engine thread panicked");
		}
	}
}

impl Drop for EngineRunner {
	fn drop(&mut self) {
		self.stop();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		engine::ResultSink,
		queue::IngressQueue,
		types::{MatchResult, SymbolInfo},
	};
	use bourse_types::{OrderType, Side};
	use rust_decimal::Decimal;

	struct NullSink;

	impl ResultSink for NullSink {
		fn send_match_result(&mut self, _result: MatchResult) {}
	}

	fn create_test_engine() -> MatchEngine {
		MatchEngine::new(SymbolInfo::default(), Box::new(NullSink))
	}

	fn create_test_command(sequence_id: u64) -> OrderCommand {
		OrderCommand {
			order_id: format!("order_{}", sequence_id),
			sequence_id,
			uid: 1,
			side: Side::Sell,
			order_type: OrderType::Limit,
			price: Decimal::new(100 + sequence_id as i64, 0),
			qty: Decimal::ONE,
			amount: Decimal::ZERO,
			is_cancel: false,
		}
	}

	#[test]
	fn test_drain_stops_at_max() {
		let mut engine = create_test_engine();
		let (sender, receiver) = IngressQueue::new(10).split();
		for seq in 1..=3 {
			sender.enqueue(create_test_command(seq)).unwrap();
		}

		let drained = EngineRunner::drain(&mut engine, &receiver, &EngineConfig::default(), 2);

		assert_eq!(drained, 2);
		assert_eq!(receiver.len(), 1);
		assert_eq!(engine.asks().len(), 2);
		assert_eq!(engine.current_seq_id(), 2);
	}

	#[test]
	fn test_drain_stops_when_empty() {
		let mut engine = create_test_engine();
		let (sender, receiver) = IngressQueue::new(10).split();
		sender.enqueue(create_test_command(1)).unwrap();

		let drained =
			EngineRunner::drain(&mut engine, &receiver, &EngineConfig::default(), usize::MAX);

		assert_eq!(drained, 1);
		assert!(receiver.is_empty());
		assert_eq!(engine.best_ask(), Some(Decimal::new(101, 0)));
	}
}
