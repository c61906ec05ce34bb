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

use tokio::sync::oneshot;

use crate::depth::DepthData;

/// Control messages for the matching loop
///
/// Processed on the matching thread between orders, so readers observe the
/// book exactly as it stands after the last handled order.
#[derive(Debug)]
pub enum EngineControlMessage {
	/// Request the top `level` aggregated price levels of each side
	///
	/// Answered once the orders already queued when it arrives are matched.
	/// Orders enqueued after that are left for the main loop.
	GetDepth {
		level: i32,
		respond_to: oneshot::Sender<DepthData>,
	},

	/// Drain the orders already queued, then stop
	Shutdown,
}
