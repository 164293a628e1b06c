/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use crate::{
    common::{
        debounce::DebounceStore, engine::PresenceEngine, presence::PresenceStore, types::*,
    },
    outbound::{
        dispatcher::{AlertDispatcher, EventLog},
        records::SubjectRecords,
    },
    tools::{
        error::AppError,
        prometheus::{DISPATCH_FAILURES, TOTAL_SAMPLES_PROCESSED, TRACKER_EVENTS},
    },
};
use chrono::Utc;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::{sync::Arc, time::Duration};
use tokio::sync::mpsc;
use tokio::time::{interval, timeout};
use tracing::{debug, error, info};

#[derive(Debug, Clone)]
pub enum TrackerMessage {
    Sample(LocationSample),
    ReplacePlaces {
        family_id: FamilyId,
        places: Vec<PlaceRecord>,
    },
}

/// Where engine events end up. Every call is cut off after `dispatch_timeout`
/// so a stalled callback cannot hold up evaluation of the samples behind it.
#[derive(Clone)]
pub struct EventSinks {
    pub dispatcher: Arc<dyn AlertDispatcher>,
    pub event_log: Arc<dyn EventLog>,
    pub dispatch_timeout: Duration,
}

impl EventSinks {
    pub fn new(
        dispatcher: Arc<dyn AlertDispatcher>,
        event_log: Arc<dyn EventLog>,
        dispatch_timeout: Duration,
    ) -> Self {
        Self {
            dispatcher,
            event_log,
            dispatch_timeout,
        }
    }

    async fn deliver<F>(&self, tag: &str, call: F)
    where
        F: Future<Output = Result<(), AppError>>,
    {
        let result = timeout(self.dispatch_timeout, call)
            .await
            .unwrap_or(Err(AppError::DispatchTimeout));

        if let Err(err) = result {
            DISPATCH_FAILURES.inc();
            error!(tag = tag, error = %err, message = %err.message());
        }
    }
}

/// Hands every engine event to its sink. Failures are counted and logged, never retried,
/// and never stop the remaining events from being delivered.
pub async fn dispatch_events(events: Vec<EngineEvent>, sinks: &EventSinks) {
    let dispatcher = sinks.dispatcher.as_ref();
    let event_log = sinks.event_log.as_ref();

    for event in events {
        match event {
            EngineEvent::Transition { event, notify } => {
                let TransitionEvent {
                    subject,
                    place,
                    kind,
                    timestamp,
                } = event;
                TRACKER_EVENTS
                    .with_label_values(&[kind.to_string().as_str()])
                    .inc();

                let current_place = match kind {
                    TransitionKind::Arrived => Some(place.name.to_owned()),
                    TransitionKind::Left => None,
                };
                sinks
                    .deliver(
                        "[Set Current Place]",
                        dispatcher.set_current_place(&subject.subject_id, current_place),
                    )
                    .await;

                if !notify {
                    debug!(tag = "[Self Transition]", subject_id = %subject.subject_id.0, place = %place.name, kind = %kind);
                    continue;
                }
                match kind {
                    TransitionKind::Arrived => {
                        sinks
                            .deliver(
                                "[Transition Alert]",
                                dispatcher.notify_arrival(&subject, &place, timestamp),
                            )
                            .await
                    }
                    TransitionKind::Left => {
                        sinks
                            .deliver(
                                "[Transition Alert]",
                                dispatcher.notify_departure(&subject, &place, timestamp),
                            )
                            .await
                    }
                }
            }
            EngineEvent::Driving(event) => {
                TRACKER_EVENTS
                    .with_label_values(&[event.kind.to_string().as_str()])
                    .inc();
                sinks
                    .deliver(
                        "[Driving Event Log]",
                        event_log.append_driving_event(&event),
                    )
                    .await;
                match event.kind {
                    DrivingEventKind::Speeding => {
                        sinks
                            .deliver("[Driving Alert]", dispatcher.notify_speeding(&event))
                            .await
                    }
                    DrivingEventKind::HarshBraking => {
                        sinks
                            .deliver("[Driving Alert]", dispatcher.notify_harsh_braking(&event))
                            .await
                    }
                }
            }
            EngineEvent::Alert(MemberAlert::Panic { subject, timestamp }) => {
                TRACKER_EVENTS.with_label_values(&["PANIC"]).inc();
                sinks
                    .deliver("[Panic Alert]", dispatcher.notify_panic(&subject, timestamp))
                    .await;
            }
            EngineEvent::Alert(MemberAlert::LowBattery {
                subject,
                level,
                timestamp,
            }) => {
                TRACKER_EVENTS.with_label_values(&["LOW_BATTERY"]).inc();
                sinks
                    .deliver(
                        "[Low Battery Alert]",
                        dispatcher.notify_low_battery(&subject, level, timestamp),
                    )
                    .await;
            }
            EngineEvent::History(point) => {
                TRACKER_EVENTS.with_label_values(&["HISTORY"]).inc();
                sinks
                    .deliver("[History Log]", event_log.append_history_point(&point))
                    .await;
            }
        }
    }
}

async fn handle_message<P, D>(
    message: TrackerMessage,
    engine: &mut PresenceEngine<P, D>,
    sinks: &EventSinks,
    subject_records: &SubjectRecords,
) where
    P: PresenceStore,
    D: DebounceStore,
{
    match message {
        TrackerMessage::Sample(sample) => {
            if !engine.accepts(&sample) {
                debug!(tag = "[Sample Dropped]", subject_id = %sample.subject.subject_id.0);
                return;
            }
            subject_records.record_sample(&sample).await;
            let events = engine.process(&sample, TimeStamp(Utc::now()));
            TOTAL_SAMPLES_PROCESSED.inc();
            dispatch_events(events, sinks).await;
        }
        TrackerMessage::ReplacePlaces { family_id, places } => {
            if family_id.0 == engine.session().family_id {
                engine.replace_places(places);
            } else {
                error!(tag = "[Places From Other Family]", family_id = %family_id.0);
            }
        }
    }
}

/// Single consumer of the tracker channel. Every sample is evaluated in arrival order.
///
/// Returns when the channel closes, or after draining whatever is queued once
/// termination is requested.
pub async fn run_tracker<P, D>(
    mut rx: mpsc::Receiver<TrackerMessage>,
    graceful_termination_requested: Arc<AtomicBool>,
    mut engine: PresenceEngine<P, D>,
    sinks: EventSinks,
    subject_records: SubjectRecords,
    heartbeat_seconds: u64,
) where
    P: PresenceStore,
    D: DebounceStore,
{
    let mut timer = interval(Duration::from_secs(heartbeat_seconds.max(1)));
    let mut processed: usize = 0;

    loop {
        if graceful_termination_requested.load(Ordering::Relaxed) {
            info!(tag = "[Graceful Shutting Down]");
            rx.close();
            while let Ok(message) = rx.try_recv() {
                handle_message(message, &mut engine, &sinks, &subject_records).await;
            }
            break;
        }
        tokio::select! {
            item = rx.recv() => {
                match item {
                    Some(message) => {
                        handle_message(message, &mut engine, &sinks, &subject_records).await;
                        processed += 1;
                    },
                    None => break,
                }
            },
            _ = timer.tick() => {
                info!(tag = "[Tracker Heartbeat]", processed = %processed, places = %engine.places().len());
                processed = 0;
            },
        }
    }
}
