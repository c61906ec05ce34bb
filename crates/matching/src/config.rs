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

use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{dispatch::RetryPolicy, types::SymbolInfo};

/// Default log level (can be overridden by RUST_LOG environment variable)
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Component name, used for the log directory and file prefix
pub const LOG_COMPONENT_NAME: &str = "matching";

/// Default console output enabled (can be overridden by LOG_TO_CONSOLE environment variable)
pub const DEFAULT_LOG_TO_CONSOLE: bool = false;

/// Matching engine configuration
///
/// Environment variables use the `MATCHING_` prefix and `__` for nesting,
/// e.g. `MATCHING_SYMBOL__SYMBOL_NAME=ETH_USDT` or `MATCHING_VERBOSE_LOGGING=true`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
	/// Instrument this engine matches
	pub symbol: SymbolInfo,
	/// Capacity of the ingress queue
	pub ingress_queue_size: usize,
	/// Capacity of the queue feeding the tick worker
	pub tick_queue_capacity: usize,
	/// Broker publish attempts per message, the first one included
	pub publish_max_attempts: u32,
	/// Pause between publish attempts (milliseconds)
	pub publish_retry_interval_ms: u64,
	/// Topic prefix for public ticks, joined to the symbol name with `@`
	pub tick_topic_prefix: String,
	pub verbose_logging: bool,
}

impl Default for MatchingConfig {
	fn default() -> Self {
		Self {
			symbol: SymbolInfo::default(),
			ingress_queue_size: 10_000,
			tick_queue_capacity: 10,
			publish_max_attempts: 10,
			publish_retry_interval_ms: 1_000,
			tick_topic_prefix: "tick".to_string(),
			verbose_logging: false,
		}
	}
}

impl MatchingConfig {
	/// Load configuration from environment variables
	pub fn from_env() -> Result<Self, config::ConfigError> {
		let cfg = config::Config::builder()
			.add_source(Self::environment())
			.build()?;

		cfg.try_deserialize()
	}

	/// Load configuration from file, with environment overrides
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, config::ConfigError> {
		let cfg = config::Config::builder()
			.add_source(config::File::from(path.as_ref()))
			.add_source(Self::environment())
			.build()?;

		cfg.try_deserialize()
	}

	fn environment() -> config::Environment {
		config::Environment::with_prefix("MATCHING")
			.prefix_separator("_")
			.separator("__")
			.try_parsing(true)
	}

	pub fn retry_policy(&self) -> RetryPolicy {
		RetryPolicy {
			max_attempts: self.publish_max_attempts,
			interval: Duration::from_millis(self.publish_retry_interval_ms),
		}
	}

	/// Push-proxy topic for this symbol's ticks
	pub fn tick_topic(&self) -> String {
		format!("{}@{}", self.tick_topic_prefix, self.symbol.symbol_name)
	}
}
