/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
#![allow(clippy::expect_used)]

use serde::Deserialize;
use tracing::subscriber::set_global_default;
pub use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, EnvFilter, Registry};

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub enum LogLevel {
    TRACE,
    DEBUG,
    INFO,
    WARN,
    ERROR,
    OFF,
}

impl From<LogLevel> for LevelFilter {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::TRACE => LevelFilter::TRACE,
            LogLevel::DEBUG => LevelFilter::DEBUG,
            LogLevel::INFO => LevelFilter::INFO,
            LogLevel::WARN => LevelFilter::WARN,
            LogLevel::ERROR => LevelFilter::ERROR,
            LogLevel::OFF => LevelFilter::OFF,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggerConfig {
    pub level: LogLevel,
    pub log_to_file: bool,
    pub log_directory: String,
}

/// Builds the level filter. `RUST_LOG`, when set and valid, wins over the configured level,
/// which lets the geofence debug traces be switched on for a single module.
fn level_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::from(level).into()))
}

/// Installs the global bunyan JSON subscriber, writing to stdout and, when
/// `log_to_file` is set, to a daily rolling file under `log_directory`.
///
/// Keep the returned guard alive for the lifetime of the process, dropping it
/// stops the background writer and unflushed lines are lost.
///
/// # Panics
///
/// * If the `log` bridge or the global subscriber was already installed.
pub fn setup_tracing(logger_cfg: &LoggerConfig) -> WorkerGuard {
    LogTracer::init().expect("Failed to setup logger");

    let app_name = concat!(env!("CARGO_PKG_NAME"), "-", env!("CARGO_PKG_VERSION")).to_string();

    let (non_blocking_console_writer, guard) = tracing_appender::non_blocking(std::io::stdout());

    let bunyan_console_formatting_layer =
        BunyanFormattingLayer::new(app_name.to_owned(), non_blocking_console_writer);

    let file_formatting_layer = logger_cfg.log_to_file.then(|| {
        let file_writer = tracing_appender::rolling::daily(
            logger_cfg.log_directory.as_str(),
            format!("{app_name}.log"),
        );
        BunyanFormattingLayer::new(app_name.to_owned(), file_writer)
    });

    let subscriber = Registry::default()
        .with(level_filter(logger_cfg.level))
        .with(JsonStorageLayer)
        .with(file_formatting_layer)
        .with(bunyan_console_formatting_layer);

    set_global_default(subscriber).expect("Unable to set global tracing subscriber");

    guard
}
