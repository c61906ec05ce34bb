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

//! Matching engine service entry point
//!
//! Reads one JSON order command per line from stdin, matches it and writes
//! each broker message as a JSON line to stdout. Ticks go to the log.
//!
//! Set `MATCHING_CONFIG_FILE` to load a config file; otherwise
//! configuration comes from `MATCHING_*` environment variables.

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{info, warn};

use bourse_matching::{
	IngressQueue, LogPushProxy, MatchEngine, OrderCommand, QueueSender,
	ResultDispatcher, TickQueue, TickWorker, config::MatchingConfig, dispatch::JsonLinesPublisher,
	engine::{EngineConfig, EngineRunner},
};

const FINAL_DEPTH_LEVELS: i32 = 5;

#[tokio::main]
async fn main() -> Result<()> {
	bourse_matching::logging::init_logging()?;

	let config = match std::env::var("MATCHING_CONFIG_FILE") {
		Ok(path) => MatchingConfig::from_file(&path)
			.with_context(|| format!("Failed to load config file {}", path))?,
		Err(_) => MatchingConfig::from_env().unwrap_or_else(|e| {
			info!(target: "server", error = %e, "Using default configuration");
			MatchingConfig::default()
		}),
	};

	info!(target: "server", "Starting Bourse Matching Engine");
	info!(target: "server", "Symbol: {}", config.symbol.symbol_name);
	info!(target: "server", "Ingress queue size: {}", config.ingress_queue_size);
	info!(target: "server", "Tick queue capacity: {}", config.tick_queue_capacity);

	let (tick_producer, tick_consumer) = TickQueue::new(config.tick_queue_capacity).split();
	let tick_worker = TickWorker::start(
		tick_consumer,
		Box::new(LogPushProxy),
		config.symbol.clone(),
		config.tick_topic(),
	)
	.context("Failed to start tick worker")?;

	let dispatcher = ResultDispatcher::new(
		config.symbol.clone(),
		Box::new(JsonLinesPublisher::new(std::io::stdout())),
		config.retry_policy(),
		tick_producer,
	);
	let engine = MatchEngine::new(config.symbol.clone(), Box::new(dispatcher));

	let (queue_sender, queue_receiver) = IngressQueue::new(config.ingress_queue_size).split();
	let runner = EngineRunner::start(
		engine,
		queue_receiver,
		EngineConfig {
			verbose_logging: config.verbose_logging,
		},
	)
	.context("Failed to start matching engine")?;

	tokio::select! {
		result = read_orders(&queue_sender) => {
			let accepted = result?;
			info!(target: "server", accepted, "Input exhausted");
		}
		_ = signal::ctrl_c() => {
			info!(target: "server", "Shutting down...");
		}
	}

	match runner.depth_async(FINAL_DEPTH_LEVELS).await {
		Ok(depth) => info!(
			target: "server",
			depth = %serde_json::to_string(&depth).unwrap_or_default(),
			"Final depth"
		),
		Err(e) => warn!(target: "server", error = %e, "Failed to read final depth"),
	}

	info!(target: "server", "Shutting down components...");
	drop(queue_sender);
	tokio::task::spawn_blocking(move || {
		runner.shutdown();
		tick_worker.shutdown();
	})
	.await
	.context("Shutdown task failed")?;

	info!(target: "server", "Shutdown complete");
	Ok(())
}

/// Forward stdin commands into the ingress queue until EOF
async fn read_orders(sender: &QueueSender) -> Result<usize> {
	let mut lines = BufReader::new(tokio::io::stdin()).lines();
	let mut accepted = 0;

	while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
		let line = line.trim();
		if line.is_empty() {
			continue;
		}
		let cmd: OrderCommand = match serde_json::from_str(line) {
			Ok(cmd) => cmd,
			Err(e) => {
				warn!(target: "server", error = %e, "Skipping malformed order command");
				continue;
			}
		};

		// Blocks while the queue is full
		tokio::task::block_in_place(|| sender.enqueue(cmd)).context("Matching engine stopped")?;
		accepted += 1;
	}

	Ok(accepted)
}
