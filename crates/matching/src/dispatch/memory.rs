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
	io::Write,
	sync::{
		Arc, Mutex, MutexGuard,
		atomic::{AtomicUsize, Ordering},
	},
};

use bourse_types::{MatchMessage, TickMessage};
use tracing::{debug, warn};

use super::{DispatchError, MessagePublisher, PushProxy};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-memory publisher
///
/// Keeps every published payload. Clones share the same buffer, so a test
/// can hand one clone to the dispatcher and inspect the other.
#[derive(Clone, Default)]
pub struct MemoryPublisher {
	payloads: Arc<Mutex<Vec<Vec<u8>>>>,
	failures_left: Arc<AtomicUsize>,
	attempts: Arc<AtomicUsize>,
}

impl MemoryPublisher {
	pub fn new() -> Self {
		Self::default()
	}

	/// Make the next `count` publish attempts fail
	pub fn fail_next(&self, count: usize) {
		self.failures_left.store(count, Ordering::SeqCst);
	}

	/// Total publish attempts, failed ones included
	pub fn attempts(&self) -> usize {
		self.attempts.load(Ordering::SeqCst)
	}

	pub fn payloads(&self) -> Vec<Vec<u8>> {
		lock(&self.payloads).clone()
	}

	/// Published payloads decoded back into messages; undecodable ones are skipped
	pub fn messages(&self) -> Vec<MatchMessage> {
		lock(&self.payloads)
			.iter()
			.filter_map(|payload| MatchMessage::from_slice(payload).ok())
			.collect()
	}
}

impl MessagePublisher for MemoryPublisher {
	fn publish(&mut self, payload: &[u8]) -> Result<(), DispatchError> {
		self.attempts.fetch_add(1, Ordering::SeqCst);
		let injected = self
			.failures_left
			.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
			.is_ok();
		if injected {
			return Err(DispatchError::Publish("injected failure".to_string()));
		}
		lock(&self.payloads).push(payload.to_vec());
		Ok(())
	}
}

/// Publisher writing one JSON message per line
pub struct JsonLinesPublisher<W: Write + Send> {
	writer: W,
}

impl<W: Write + Send> JsonLinesPublisher<W> {
	pub fn new(writer: W) -> Self {
		Self { writer }
	}

	pub fn into_inner(self) -> W {
		self.writer
	}
}

impl<W: Write + Send> MessagePublisher for JsonLinesPublisher<W> {
	fn publish(&mut self, payload: &[u8]) -> Result<(), DispatchError> {
		self.writer.write_all(payload)?;
		self.writer.write_all(b"\n")?;
		self.writer.flush()?;
		Ok(())
	}
}

/// In-memory push proxy, shared across clones
#[derive(Clone, Default)]
pub struct MemoryPushProxy {
	pushed: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
}

impl MemoryPushProxy {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		lock(&self.pushed).len()
	}

	pub fn is_empty(&self) -> bool {
		lock(&self.pushed).is_empty()
	}

	/// Pushed ticks decoded; undecodable payloads are skipped
	pub fn ticks(&self) -> Vec<TickMessage> {
		lock(&self.pushed)
			.iter()
			.filter_map(|(_, payload)| serde_json::from_slice(payload).ok())
			.collect()
	}

	pub fn topics(&self) -> Vec<String> {
		lock(&self.pushed).iter().map(|(topic, _)| topic.clone()).collect()
	}
}

impl PushProxy for MemoryPushProxy {
	fn push(&self, topic: &str, payload: &[u8]) -> Result<(), DispatchError> {
		lock(&self.pushed).push((topic.to_string(), payload.to_vec()));
		Ok(())
	}
}

/// Push proxy that only logs each tick
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPushProxy;

impl PushProxy for LogPushProxy {
	fn push(&self, topic: &str, payload: &[u8]) -> Result<(), DispatchError> {
		match std::str::from_utf8(payload) {
			Ok(text) => debug!(target: "tick_worker", topic = %topic, tick = %text, "Tick"),
			Err(_) => warn!(target: "tick_worker", topic = %topic, "Tick payload is not UTF-8"),
		}
		Ok(())
	}
}
