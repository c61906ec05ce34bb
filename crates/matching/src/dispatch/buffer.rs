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

use std::time::Duration;

use crossbeam::channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, bounded};

use crate::types::MatchResult;

/// Bounded hand-off from the dispatcher to the tick worker
///
/// Pushing blocks while the queue is full, so a slow push proxy slows the
/// matching loop down instead of dropping ticks.
pub struct TickQueue {
	sender: Sender<MatchResult>,
	receiver: Receiver<MatchResult>,
}

impl TickQueue {
	pub fn new(capacity: usize) -> Self {
		let (sender, receiver) = bounded(capacity);
		Self { sender, receiver }
	}

	pub fn split(self) -> (TickProducer, TickConsumer) {
		(
			TickProducer {
				sender: self.sender,
			},
			TickConsumer {
				receiver: self.receiver,
			},
		)
	}
}

/// Producer end of the tick queue (used by the dispatcher)
pub struct TickProducer {
	sender: Sender<MatchResult>,
}

impl TickProducer {
	/// Push a result, waiting while the queue is full
	pub fn push(&self, result: MatchResult) -> Result<(), TickQueueError> {
		self.sender
			.send(result)
			.map_err(|_| TickQueueError::Disconnected)
	}

	pub fn is_full(&self) -> bool {
		self.sender.is_full()
	}
}

/// Consumer end of the tick queue (used by the tick worker)
pub struct TickConsumer {
	receiver: Receiver<MatchResult>,
}

impl TickConsumer {
	/// Wait up to `timeout` for a result; `Ok(None)` on timeout
	pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<MatchResult>, TickQueueError> {
		match self.receiver.recv_timeout(timeout) {
			Ok(result) => Ok(Some(result)),
			Err(RecvTimeoutError::Timeout) => Ok(None),
			Err(RecvTimeoutError::Disconnected) => Err(TickQueueError::Disconnected),
		}
	}

	pub fn try_recv(&self) -> Result<MatchResult, TickQueueError> {
		self.receiver.try_recv().map_err(|e| match e {
			TryRecvError::Empty => TickQueueError::Empty,
			TryRecvError::Disconnected => TickQueueError::Disconnected,
		})
	}

	/// Take everything currently queued without waiting
	pub fn drain(&self) -> Vec<MatchResult> {
		self.receiver.try_iter().collect()
	}
}

#[derive(Debug, thiserror::Error)]
pub enum TickQueueError {
	#[error("Tick queue is empty")]
	Empty,
	#[error("Tick queue disconnected")]
	Disconnected,
}
