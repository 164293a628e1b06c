/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
#![allow(clippy::expect_used)]

use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use prometheus::{
    opts, register_histogram_vec, register_int_counter, register_int_counter_vec, HistogramVec,
    IntCounter, IntCounterVec,
};

pub static INCOMING_API: once_cell::sync::Lazy<HistogramVec> = once_cell::sync::Lazy::new(|| {
    register_histogram_vec!(
        opts!("http_request_duration_seconds", "Incoming API requests").into(),
        &["method", "handler", "status_code", "code", "version"]
    )
    .expect("Failed to register incoming API metrics")
});

pub static CALL_EXTERNAL_API: once_cell::sync::Lazy<HistogramVec> =
    once_cell::sync::Lazy::new(|| {
        register_histogram_vec!(
            opts!("external_request_duration", "Outgoing API requests").into(),
            &["method", "host", "service", "status", "version"]
        )
        .expect("Failed to register external API metrics")
    });

pub static TOTAL_SAMPLES_PROCESSED: once_cell::sync::Lazy<IntCounter> =
    once_cell::sync::Lazy::new(|| {
        register_int_counter!("total_samples_processed", "Location samples evaluated by the tracker")
            .expect("Failed to register total samples processed metrics")
    });

pub static TRACKER_EVENTS: once_cell::sync::Lazy<IntCounterVec> =
    once_cell::sync::Lazy::new(|| {
        register_int_counter_vec!(
            opts!("tracker_events", "Events emitted by the presence engine"),
            &["kind"]
        )
        .expect("Failed to register tracker events metrics")
    });

pub static DISPATCH_FAILURES: once_cell::sync::Lazy<IntCounter> =
    once_cell::sync::Lazy::new(|| {
        register_int_counter!("dispatch_failures", "Alert dispatches that failed and were dropped")
            .expect("Failed to register dispatch failures metrics")
    });

/// Observes the duration of an incoming API request.
///
/// * `$method` - HTTP method of the request.
/// * `$endpoint` - Route with path parameters replaced by placeholders.
/// * `$status` - HTTP status code of the response.
/// * `$code` - Error code of the response, `SUCCESS` otherwise.
/// * `$start` - Instant at which the request was received.
#[macro_export]
macro_rules! incoming_api {
    ($method:expr, $endpoint:expr, $status:expr, $code:expr, $start:expr) => {
        let duration = $start.elapsed().as_secs_f64();
        let version = std::env::var("DEPLOYMENT_VERSION").unwrap_or("DEV".to_string());
        INCOMING_API
            .with_label_values(&[$method, $endpoint, $status, $code, version.as_str()])
            .observe(duration);
    };
}

#[macro_export]
macro_rules! call_external_api {
    ($method:expr, $host:expr, $path:expr, $status:expr, $start:expr) => {
        let duration = $start.elapsed().as_secs_f64();
        let version = std::env::var("DEPLOYMENT_VERSION").unwrap_or("DEV".to_string());
        CALL_EXTERNAL_API
            .with_label_values(&[$method, $host, $path, $status, version.as_str()])
            .observe(duration);
    };
}

/// Builds the `/metrics` endpoint middleware with every service metric registered.
///
/// # Panics
///
/// * If the metrics endpoint cannot be built or a metric cannot be registered.
pub fn prometheus_metrics() -> PrometheusMetrics {
    let prometheus = PrometheusMetricsBuilder::new("presence_tracking_service")
        .endpoint("/metrics")
        .build()
        .expect("Failed to create Prometheus metrics");

    prometheus
        .registry
        .register(Box::new(INCOMING_API.to_owned()))
        .expect("Failed to register incoming API metrics");

    prometheus
        .registry
        .register(Box::new(CALL_EXTERNAL_API.to_owned()))
        .expect("Failed to register external API metrics");

    prometheus
        .registry
        .register(Box::new(TOTAL_SAMPLES_PROCESSED.to_owned()))
        .expect("Failed to register total samples processed metrics");

    prometheus
        .registry
        .register(Box::new(TRACKER_EVENTS.to_owned()))
        .expect("Failed to register tracker events metrics");

    prometheus
        .registry
        .register(Box::new(DISPATCH_FAILURES.to_owned()))
        .expect("Failed to register dispatch failures metrics");

    prometheus
}
