/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use actix_web::{web, App, HttpServer};
use presence_tracking_service::{
    common::engine::PresenceEngine,
    domain::api,
    environment::{AppConfig, AppState},
    middleware::*,
    outbound::{
        dispatcher::{AlertDispatcher, CallbackDispatcher, EventLog, InMemoryEventLog},
        records::SubjectRecords,
    },
    tools::{error::AppError, logger::*, prometheus::prometheus_metrics},
    tracker::{run_tracker, EventSinks, TrackerMessage},
};
use std::{
    env::var,
    sync::atomic::{AtomicBool, Ordering},
    sync::Arc,
    time::Duration,
};
use tokio::{
    signal::unix::{signal, SignalKind},
    sync::mpsc::{self, Receiver, Sender},
};
use tracing_actix_web::TracingLogger;
use url::Url;

pub fn read_dhall_config(config_path: &str) -> Result<AppConfig, String> {
    let config = serde_dhall::from_file(config_path).parse::<AppConfig>();
    match config {
        Ok(config) => Ok(config),
        Err(e) => Err(format!("Error reading config: {}", e)),
    }
}

fn listen_for_signal(kind: SignalKind, graceful_termination_requested: Arc<AtomicBool>) {
    tokio::spawn(async move {
        match signal(kind) {
            Ok(mut stream) => {
                stream.recv().await;
                graceful_termination_requested.store(true, Ordering::Relaxed);
            }
            Err(err) => error!(tag = "[Signal Listener]", error = %err),
        }
    });
}

#[actix_web::main]
async fn start_server() -> std::io::Result<()> {
    let dhall_config_path = var("DHALL_CONFIG")
        .unwrap_or_else(|_| "./dhall_config/presence_tracking_service.dhall".to_string());
    let app_config = read_dhall_config(&dhall_config_path).unwrap_or_else(|err| {
        println!("Dhall Config Reading Error : {}", err);
        std::process::exit(1);
    });

    let callback_url = match app_config.notification_callback_url.as_deref() {
        Some(url) => match Url::parse(url) {
            Ok(url) => Some(url),
            Err(err) => {
                println!("Invalid notification callback url {url} : {err}");
                std::process::exit(1);
            }
        },
        None => None,
    };

    let _guard = setup_tracing(&app_config.logger_cfg);

    let (sender, receiver): (Sender<TrackerMessage>, Receiver<TrackerMessage>) =
        mpsc::channel(app_config.tracker_queue_size);

    let subject_records = SubjectRecords::new();
    let event_log = InMemoryEventLog::new();
    let dispatcher: Arc<dyn AlertDispatcher> = Arc::new(CallbackDispatcher::new(
        callback_url,
        subject_records.to_owned(),
    ));
    let tracker_event_log: Arc<dyn EventLog> = Arc::new(event_log.to_owned());
    let engine = PresenceEngine::new(app_config.engine_cfg.to_owned());

    info!(
        tag = "[Session]",
        self_subject_id = %app_config.engine_cfg.session_cfg.self_subject_id,
        family_id = %app_config.engine_cfg.session_cfg.family_id
    );

    let app_state = AppState::new(
        &app_config,
        sender,
        subject_records.to_owned(),
        event_log,
    );
    let data = web::Data::new(app_state);

    let graceful_termination_requested = Arc::new(AtomicBool::new(false));
    listen_for_signal(
        SignalKind::terminate(),
        graceful_termination_requested.to_owned(),
    );
    listen_for_signal(
        SignalKind::interrupt(),
        graceful_termination_requested.to_owned(),
    );

    let heartbeat_seconds = app_config.tracker_heartbeat_seconds;
    let sinks = EventSinks::new(
        dispatcher,
        tracker_event_log,
        Duration::from_millis(app_config.dispatch_timeout_millis),
    );
    let tracker_thread = tokio::spawn(async move {
        run_tracker(
            receiver,
            graceful_termination_requested,
            engine,
            sinks,
            subject_records,
            heartbeat_seconds,
        )
        .await;
    });

    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .app_data(
                web::JsonConfig::default()
                    .error_handler(|err, _| AppError::UnprocessibleRequest(err.to_string()).into()),
            )
            .wrap(LogIncomingRequestBody)
            .wrap(CheckContentLength)
            .wrap(RequestTimeout)
            .wrap(IncomingRequestMetrics)
            .wrap(TracingLogger::<DomainRootSpanBuilder>::new())
            .wrap(prometheus_metrics())
            .configure(api::handler)
    })
    .workers(app_config.workers)
    .bind(("0.0.0.0", app_config.port))?
    .run()
    .await?;

    if let Err(err) = tracker_thread.await {
        error!(tag = "[Tracker Stopped]", error = %err);
    }

    Ok(())
}

fn main() -> std::io::Result<()> {
    start_server()
}
