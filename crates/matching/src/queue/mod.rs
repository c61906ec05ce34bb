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

use crossbeam::channel::{Receiver, Sender, TryRecvError, TrySendError, bounded};

use crate::types::OrderCommand;

/// Ingress queue between order producers and the matching loop
///
/// Many producers, one consumer. The consumer sees commands in the order
/// they were enqueued, which is the order the engine processes them in.
/// Capacity is bounded: producers either block ([`QueueSender::enqueue`])
/// or observe [`QueueError::Full`] ([`QueueSender::try_enqueue`]).
pub struct IngressQueue {
	sender: Sender<OrderCommand>,
	receiver: Receiver<OrderCommand>,
}

impl IngressQueue {
	pub fn new(capacity: usize) -> Self {
		let (sender, receiver) = bounded(capacity);
		Self { sender, receiver }
	}

	/// Split the queue into sender and receiver ends
	///
	/// The sender can be cloned freely; the receiver belongs to the
	/// matching loop.
	pub fn split(self) -> (QueueSender, QueueReceiver) {
		(
			QueueSender {
				sender: self.sender,
			},
			QueueReceiver {
				receiver: self.receiver,
			},
		)
	}
}

/// Sender end of the ingress queue
#[derive(Clone)]
pub struct QueueSender {
	sender: Sender<OrderCommand>,
}

impl QueueSender {
	/// Enqueue a command, waiting while the queue is full
	pub fn enqueue(&self, cmd: OrderCommand) -> Result<(), QueueError> {
		self.sender.send(cmd).map_err(|_| QueueError::Disconnected)
	}

	/// Enqueue a command without waiting
	pub fn try_enqueue(&self, cmd: OrderCommand) -> Result<(), QueueError> {
		self.sender.try_send(cmd).map_err(|e| match e {
			TrySendError::Full(_) => QueueError::Full,
			TrySendError::Disconnected(_) => QueueError::Disconnected,
		})
	}

	pub fn is_full(&self) -> bool {
		self.sender.is_full()
	}

	pub fn len(&self) -> usize {
		self.sender.len()
	}

	pub fn is_empty(&self) -> bool {
		self.sender.is_empty()
	}
}

/// Receiver end of the ingress queue
pub struct QueueReceiver {
	receiver: Receiver<OrderCommand>,
}

impl QueueReceiver {
	/// Receive a command (blocking)
	pub fn recv(&self) -> Result<OrderCommand, QueueError> {
		self.receiver.recv().map_err(|_| QueueError::Disconnected)
	}

	/// Receive a command (non-blocking)
	pub fn try_recv(&self) -> Result<OrderCommand, QueueError> {
		self.receiver.try_recv().map_err(|e| match e {
			TryRecvError::Empty => QueueError::Empty,
			TryRecvError::Disconnected => QueueError::Disconnected,
		})
	}

	/// Number of commands waiting to be matched
	pub fn len(&self) -> usize {
		self.receiver.len()
	}

	pub fn is_empty(&self) -> bool {
		self.receiver.is_empty()
	}

	pub(crate) fn receiver(&self) -> &Receiver<OrderCommand> {
		&self.receiver
	}
}

/// Errors that can occur when interacting with the ingress queue
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
	#[error("Queue is full")]
	Full,
	#[error("Queue is empty")]
	Empty,
	#[error("Queue disconnected")]
	Disconnected,
}
