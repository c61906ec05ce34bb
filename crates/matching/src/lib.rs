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

//! Bourse Matching Engine
//!
//! A single-symbol limit order book matching engine with price/time
//! priority. Orders are matched one at a time on a dedicated thread, and
//! every outcome is published as a broker message plus public ticks.
//!
//! Architecture:
//! - MPSC ingress queue feeding a single-threaded matching loop
//! - Two priority-ordered books (bids, asks) with aggregated depth
//! - Result dispatcher publishing with bounded retry
//! - Tick worker fanning trades out to the push proxy

pub mod config;
pub mod depth;
pub mod dispatch;
pub mod engine;
pub mod logging;
pub mod orderbook;
pub mod queue;
pub mod types;

pub use bourse_types::wire::{
	CancelMessage, MatchMessage, MatchedRecordMessage, MessageBody, OrderSnapshot, Tick, TickMessage,
	TradeResultMessage,
};
pub use depth::{DepthData, DepthHandler, DepthLevel};
pub use dispatch::{
	DispatchError, JsonLinesPublisher, LogPushProxy, MemoryPublisher, MemoryPushProxy,
	MessagePublisher, PushProxy, ResultDispatcher, RetryPolicy, TickQueue, TickWorker,
};
pub use engine::{
	EngineConfig, EngineError, EngineRunner, HandleOutcome, MatchEngine, RejectReason, ResultSink,
};
pub use orderbook::{OrderBook, OrderBookError};
pub use queue::{IngressQueue, QueueError, QueueReceiver, QueueSender};
pub use types::*;
