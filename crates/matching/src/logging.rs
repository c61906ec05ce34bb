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

//! Logging initialization for the matching engine
//!
//! # Configuration
//!
//! - `RUST_LOG`: log level filter (default: `info`)
//! - `LOG_DIR`: root directory for log files (default: `{project_root}/logs`).
//!   Files land in `{LOG_DIR}/matching/`
//! - `LOG_TO_CONSOLE`: set to `true`, `1` or `yes` to also log to stderr
//!
//! Files roll daily (UTC) and are named `matching.{date}.log`.

use std::{
	env,
	path::{Path, PathBuf},
	sync::OnceLock,
};

use anyhow::{Context, Result};
use tracing::info;
use tracing_appender::{
	non_blocking,
	rolling::{self, Rotation},
};
use tracing_subscriber::{
	EnvFilter, fmt, layer::SubscriberExt, registry::Registry, util::SubscriberInitExt,
};

use crate::config::{DEFAULT_LOG_LEVEL, DEFAULT_LOG_TO_CONSOLE, LOG_COMPONENT_NAME};

// Keeps the non-blocking writer flushing until exit
static LOG_GUARD: OnceLock<non_blocking::WorkerGuard> = OnceLock::new();

/// Resolved logging settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
	pub level: String,
	pub dir: PathBuf,
	pub to_console: bool,
}

impl LogSettings {
	/// Read settings from the environment, `.env` included
	pub fn from_env() -> Self {
		dotenv::dotenv().ok();

		let level = env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());
		let root = env::var("LOG_DIR")
			.map(PathBuf::from)
			.unwrap_or_else(|_| find_project_root().join("logs"));
		let to_console = env::var("LOG_TO_CONSOLE")
			.map(|v| parse_flag(&v))
			.unwrap_or(DEFAULT_LOG_TO_CONSOLE);

		Self {
			level,
			dir: root.join(LOG_COMPONENT_NAME),
			to_console,
		}
	}
}

fn parse_flag(value: &str) -> bool {
	matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

/// Nearest ancestor of the working directory holding a workspace `Cargo.toml`
fn find_project_root() -> PathBuf {
	let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
	cwd.ancestors()
		.find(|dir| {
			std::fs::read_to_string(dir.join("Cargo.toml"))
				.map(|content| content.contains("[workspace]"))
				.unwrap_or(false)
		})
		.map(Path::to_path_buf)
		.unwrap_or(cwd)
}

fn setup_file_logging(log_dir: &Path) -> Result<non_blocking::NonBlocking> {
	let file_appender = rolling::RollingFileAppender::builder()
		.rotation(Rotation::DAILY)
		.filename_prefix(LOG_COMPONENT_NAME.to_string())
		.filename_suffix("log")
		.build(log_dir)
		.with_context(|| {
			format!(
				"Failed to create rolling file appender in {}",
				log_dir.display()
			)
		})?;

	let (file_writer, guard) = non_blocking(file_appender);
	LOG_GUARD.set(guard).ok();

	Ok(file_writer)
}

/// Initialize logging with file output and optional console output
pub fn init_logging() -> Result<()> {
	let settings = LogSettings::from_env();

	std::fs::create_dir_all(&settings.dir)
		.with_context(|| format!("Failed to create log directory: {}", settings.dir.display()))?;
	let file_writer = setup_file_logging(&settings.dir)?;

	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level));

	let subscriber = Registry::default().with(filter).with(
		fmt::layer()
			.with_writer(file_writer)
			.with_timer(fmt::time::UtcTime::rfc_3339())
			.with_thread_ids(true)
			.with_thread_names(true)
			.with_target(true)
			.with_ansi(false),
	);

	if settings.to_console {
		subscriber
			.with(
				fmt::layer()
					.with_writer(std::io::stderr)
					.with_timer(fmt::time::UtcTime::rfc_3339())
					.with_thread_names(true)
					.with_target(true)
					.with_ansi(true),
			)
			.try_init()
			.context("Failed to install tracing subscriber")?;
	} else {
		subscriber
			.try_init()
			.context("Failed to install tracing subscriber")?;
	}

	info!(target: "server", "Log level: {}", settings.level);
	info!(target: "server", "Log directory: {}", settings.dir.display());
	if settings.to_console {
		info!(target: "server", "Console output: enabled");
	}

	Ok(())
}
