/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use presence_tracking_service::{
    common::{engine::PresenceEngine, types::*},
    environment::{EngineConfig, SessionConfig},
    outbound::{
        dispatcher::{AlertDispatcher, CallbackDispatcher, InMemoryEventLog},
        records::SubjectRecords,
    },
    tools::error::AppError,
    tracker::{run_tracker, EventSinks, TrackerMessage},
};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

const SELF_ID: &str = "me";
const FAMILY_ID: &str = "fam";
const HOME_LAT: f64 = -26.2041;
const HOME_LON: f64 = 28.0473;
const METERS_PER_DEGREE: f64 = 6371000.0 * std::f64::consts::PI / 180.0;

fn at(seconds: i64) -> TimeStamp {
    TimeStamp(Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap())
}

fn engine_config(notify_self_transitions: bool) -> EngineConfig {
    EngineConfig {
        session_cfg: SessionConfig {
            self_subject_id: SELF_ID.to_string(),
            family_id: FAMILY_ID.to_string(),
            notify_self_transitions,
        },
        ..EngineConfig::default()
    }
}

fn home() -> PlaceRecord {
    PlaceRecord {
        id: "home".to_string(),
        name: Some("Home".to_string()),
        lat: Some(HOME_LAT),
        lon: Some(HOME_LON),
        radius: Some(200.0),
    }
}

fn engine(notify_self_transitions: bool) -> PresenceEngine {
    let mut engine = PresenceEngine::new(engine_config(notify_self_transitions));
    assert_eq!(engine.replace_places(vec![home()]), 1);
    engine
}

fn sample(subject_id: &str, meters_north: Option<f64>, seconds: i64) -> LocationSample {
    LocationSample {
        subject: Subject {
            subject_id: SubjectId(subject_id.to_string()),
            display_name: "Member".to_string(),
        },
        location: meters_north.map(|meters_north| Point {
            lat: Latitude(HOME_LAT + meters_north / METERS_PER_DEGREE),
            lon: Longitude(HOME_LON),
        }),
        speed: None,
        timestamp: at(seconds),
        battery_level: None,
        panic_active: false,
        family_id: Some(FamilyId(FAMILY_ID.to_string())),
    }
}

fn transitions(events: &[EngineEvent]) -> Vec<(TransitionKind, bool)> {
    events
        .iter()
        .filter_map(|event| match event {
            EngineEvent::Transition { event, notify } => Some((event.kind, *notify)),
            _ => None,
        })
        .collect()
}

#[test]
fn test_family_member_comes_home_and_leaves() {
    let mut engine = engine(false);

    assert!(engine.process(&sample("mom", Some(5000.0), 0), at(0)).is_empty());
    assert_eq!(
        transitions(&engine.process(&sample("mom", Some(0.0), 120), at(120))),
        vec![(TransitionKind::Arrived, true)]
    );
    assert_eq!(
        engine.inside_places(&SubjectId("mom".to_string())),
        vec![PlaceId("home".to_string())]
    );
    assert!(engine.process(&sample("mom", Some(20.0), 180), at(180)).is_empty());
    assert!(engine.process(&sample("mom", Some(280.0), 240), at(240)).is_empty());
    assert_eq!(
        transitions(&engine.process(&sample("mom", Some(350.0), 300), at(300))),
        vec![(TransitionKind::Left, true)]
    );
    assert!(engine.inside_places(&SubjectId("mom".to_string())).is_empty());
}

#[test]
fn test_restart_inside_a_place_is_silent() {
    let mut engine = engine(false);
    assert!(engine.process(&sample("mom", Some(0.0), 0), at(0)).is_empty());
    assert_eq!(
        engine.inside_places(&SubjectId("mom".to_string())),
        vec![PlaceId("home".to_string())]
    );
}

#[test]
fn test_samples_from_another_family_are_ignored() {
    let mut engine = engine(false);
    let mut foreign = sample("mom", Some(0.0), 0);
    foreign.family_id = Some(FamilyId("other".to_string()));
    foreign.panic_active = true;

    assert!(!engine.accepts(&foreign));
    assert!(engine.process(&foreign, at(0)).is_empty());
    assert!(engine.inside_places(&SubjectId("mom".to_string())).is_empty());

    let mut untagged = sample("mom", Some(0.0), 10);
    untagged.family_id = None;
    untagged.panic_active = true;
    assert!(!engine.accepts(&untagged));
    assert!(engine.process(&untagged, at(10)).is_empty());
    assert!(engine.inside_places(&SubjectId("mom".to_string())).is_empty());

    let mut own_untagged = sample(SELF_ID, Some(0.0), 10);
    own_untagged.family_id = None;
    assert!(engine.accepts(&own_untagged));
    assert!(transitions(&engine.process(&own_untagged, at(10))).is_empty());
    assert_eq!(
        engine.inside_places(&SubjectId(SELF_ID.to_string())),
        vec![PlaceId("home".to_string())]
    );
}

#[test]
fn test_own_transitions_update_presence_without_notifying() {
    let mut silent = engine(false);
    silent.process(&sample(SELF_ID, Some(5000.0), 0), at(0));
    assert_eq!(
        transitions(&silent.process(&sample(SELF_ID, Some(0.0), 120), at(120))),
        vec![(TransitionKind::Arrived, false)]
    );

    let mut loud = engine(true);
    loud.process(&sample(SELF_ID, Some(5000.0), 0), at(0));
    assert_eq!(
        transitions(&loud.process(&sample(SELF_ID, Some(0.0), 120), at(120))),
        vec![(TransitionKind::Arrived, true)]
    );
}

#[test]
fn test_member_alerts_are_raised_for_others_only() {
    let mut engine = engine(false);

    let mut own = sample(SELF_ID, None, 0);
    own.panic_active = true;
    own.battery_level = Some(BatteryLevel(5));
    assert!(engine.process(&own, at(0)).is_empty());

    let mut mom = sample("mom", None, 0);
    mom.panic_active = true;
    mom.battery_level = Some(BatteryLevel(5));
    let events = engine.process(&mom, at(0));
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], EngineEvent::Alert(MemberAlert::Panic { .. })));
    assert!(matches!(
        events[1],
        EngineEvent::Alert(MemberAlert::LowBattery {
            level: BatteryLevel(5),
            ..
        })
    ));

    // panic repeats after its 30 second cooldown, the battery alert does not
    let events = engine.process(&mom, at(31));
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], EngineEvent::Alert(MemberAlert::Panic { .. })));
}

#[test]
fn test_driving_events_and_history_for_own_device() {
    let mut engine = engine(false);

    let mut fast = sample(SELF_ID, Some(5000.0), 0);
    fast.speed = Some(SpeedInMeterPerSecond(20.0));
    let events = engine.process(&fast, at(0));
    assert!(matches!(events.as_slice(), [EngineEvent::History(_)]));

    let mut braking = sample(SELF_ID, Some(5000.0), 2);
    braking.speed = Some(SpeedInMeterPerSecond(5.0));
    let events = engine.process(&braking, at(2));
    assert_eq!(
        events,
        vec![EngineEvent::Driving(DrivingEvent {
            subject_id: SubjectId(SELF_ID.to_string()),
            kind: DrivingEventKind::HarshBraking,
            value: 7.5,
            timestamp: at(2),
        })]
    );

    let mut speeding = sample(SELF_ID, Some(5000.0), 301);
    speeding.speed = Some(SpeedInMeterPerSecond(40.0));
    let events = engine.process(&speeding, at(301));
    assert_eq!(events.len(), 2);
    assert!(matches!(
        &events[0],
        EngineEvent::Driving(DrivingEvent {
            kind: DrivingEventKind::Speeding,
            value,
            ..
        }) if *value == 144.0
    ));
    assert!(matches!(events[1], EngineEvent::History(_)));

    // speeds of other members are never judged
    let mut mom = sample("mom", None, 302);
    mom.speed = Some(SpeedInMeterPerSecond(50.0));
    assert!(engine.process(&mom, at(302)).is_empty());
}

#[test]
fn test_place_replacement_drops_invalid_records() {
    let mut engine = engine(false);
    let accepted = engine.replace_places(vec![
        home(),
        PlaceRecord {
            id: "school".to_string(),
            name: Some("School".to_string()),
            lat: Some(HOME_LAT + 0.05),
            lon: Some(HOME_LON),
            radius: None,
        },
        PlaceRecord {
            id: "nowhere".to_string(),
            name: Some("Nowhere".to_string()),
            lat: None,
            lon: Some(HOME_LON),
            radius: Some(50.0),
        },
    ]);
    assert_eq!(accepted, 2);
    assert_eq!(
        engine
            .places()
            .get(&PlaceId("school".to_string()))
            .map(|place| place.radius),
        Some(Radius(100.0))
    );
}

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Arrival(String, String),
    Departure(String, String),
    Panic(String),
    LowBattery(String, i32),
    Driving(DrivingEventKind),
    CurrentPlace(String, Option<String>),
}

#[derive(Default, Clone)]
struct RecordingDispatcher {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl RecordingDispatcher {
    fn record(&self, call: Call) -> Result<(), AppError> {
        self.calls.lock().unwrap().push(call);
        Ok(())
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertDispatcher for RecordingDispatcher {
    async fn notify_arrival(
        &self,
        subject: &Subject,
        place: &Place,
        _timestamp: TimeStamp,
    ) -> Result<(), AppError> {
        self.record(Call::Arrival(subject.subject_id.inner(), place.name.to_owned()))
    }

    async fn notify_departure(
        &self,
        subject: &Subject,
        place: &Place,
        _timestamp: TimeStamp,
    ) -> Result<(), AppError> {
        self.record(Call::Departure(subject.subject_id.inner(), place.name.to_owned()))
    }

    async fn notify_panic(&self, subject: &Subject, _timestamp: TimeStamp) -> Result<(), AppError> {
        self.record(Call::Panic(subject.subject_id.inner()))
    }

    async fn notify_low_battery(
        &self,
        subject: &Subject,
        level: BatteryLevel,
        _timestamp: TimeStamp,
    ) -> Result<(), AppError> {
        self.record(Call::LowBattery(subject.subject_id.inner(), level.inner()))
    }

    async fn notify_speeding(&self, event: &DrivingEvent) -> Result<(), AppError> {
        self.record(Call::Driving(event.kind))
    }

    async fn notify_harsh_braking(&self, event: &DrivingEvent) -> Result<(), AppError> {
        self.record(Call::Driving(event.kind))
    }

    async fn set_current_place(
        &self,
        subject_id: &SubjectId,
        place_name: Option<String>,
    ) -> Result<(), AppError> {
        self.record(Call::CurrentPlace(subject_id.inner(), place_name))
    }
}

async fn run_to_completion(
    messages: Vec<TrackerMessage>,
    dispatcher: Arc<dyn AlertDispatcher>,
    event_log: InMemoryEventLog,
    subject_records: SubjectRecords,
) {
    let (sender, receiver) = mpsc::channel(messages.len().max(1));
    for message in messages {
        sender.send(message).await.unwrap();
    }
    drop(sender);

    let mut engine = PresenceEngine::new(engine_config(false));
    engine.replace_places(vec![home()]);

    run_tracker(
        receiver,
        Arc::new(AtomicBool::new(false)),
        engine,
        EventSinks::new(dispatcher, Arc::new(event_log), Duration::from_millis(200)),
        subject_records,
        60,
    )
    .await;
}

#[tokio::test]
async fn test_tracker_routes_events_to_the_dispatcher() {
    let dispatcher = RecordingDispatcher::default();
    let event_log = InMemoryEventLog::new();

    let mut mom_in_trouble = sample("mom", Some(0.0), 0);
    mom_in_trouble.panic_active = true;
    let mut own_speeding = sample(SELF_ID, None, 0);
    own_speeding.speed = Some(SpeedInMeterPerSecond(40.0));

    run_to_completion(
        vec![
            TrackerMessage::Sample(sample("mom", Some(5000.0), 0)),
            TrackerMessage::Sample(mom_in_trouble),
            TrackerMessage::Sample(sample(SELF_ID, Some(5000.0), 0)),
            TrackerMessage::Sample(sample(SELF_ID, Some(0.0), 1)),
            TrackerMessage::Sample(own_speeding),
        ],
        Arc::new(dispatcher.clone()),
        event_log.clone(),
        SubjectRecords::new(),
    )
    .await;

    assert_eq!(
        dispatcher.calls(),
        vec![
            Call::Panic("mom".to_string()),
            Call::CurrentPlace("mom".to_string(), Some("Home".to_string())),
            Call::Arrival("mom".to_string(), "Home".to_string()),
            Call::CurrentPlace(SELF_ID.to_string(), Some("Home".to_string())),
            Call::Driving(DrivingEventKind::Speeding),
        ]
    );

    let own_id = SubjectId(SELF_ID.to_string());
    assert_eq!(event_log.driving_events(&own_id).await.len(), 1);
    assert_eq!(event_log.history(&own_id).await.len(), 1);
}

#[tokio::test]
async fn test_tracker_maintains_shared_presence_records() {
    let subject_records = SubjectRecords::new();
    let dispatcher = CallbackDispatcher::new(None, subject_records.clone());

    let mut low_battery = sample("mom", Some(0.0), 60);
    low_battery.battery_level = Some(BatteryLevel(9));

    run_to_completion(
        vec![
            TrackerMessage::Sample(sample("mom", Some(5000.0), 0)),
            TrackerMessage::Sample(low_battery),
            TrackerMessage::ReplacePlaces {
                family_id: FamilyId("other".to_string()),
                places: vec![],
            },
        ],
        Arc::new(dispatcher),
        InMemoryEventLog::new(),
        subject_records.clone(),
    )
    .await;

    let record = subject_records
        .get(&SubjectId("mom".to_string()))
        .await
        .unwrap();
    assert_eq!(record.current_place.as_deref(), Some("Home"));
    assert_eq!(record.battery_level, Some(BatteryLevel(9)));
    assert_eq!(record.last_updated, at(60));
}

#[test]
fn test_sample_payload_shape() {
    let records: Vec<presence_tracking_service::domain::types::internal::location::SampleRecord> =
        serde_json::from_str(
            r#"[{"subjectId":"mom","lat":-26.2041,"lon":28.0473,"batteryLevel":14,"panicActive":false,"email":"mom@example.com"}]"#,
        )
        .unwrap();
    let sample = presence_tracking_service::domain::action::internal::location::validate_sample(
        records[0].to_owned(),
        at(0),
    )
    .unwrap();
    assert_eq!(sample.subject.display_name, "Mom");
    assert_eq!(sample.battery_level, Some(BatteryLevel(14)));
    assert!(sample.location.is_some());
}

/// Never answers a panic alert.
struct StalledDispatcher {
    inner: RecordingDispatcher,
}

#[async_trait]
impl AlertDispatcher for StalledDispatcher {
    async fn notify_arrival(
        &self,
        subject: &Subject,
        place: &Place,
        timestamp: TimeStamp,
    ) -> Result<(), AppError> {
        self.inner.notify_arrival(subject, place, timestamp).await
    }

    async fn notify_departure(
        &self,
        subject: &Subject,
        place: &Place,
        timestamp: TimeStamp,
    ) -> Result<(), AppError> {
        self.inner.notify_departure(subject, place, timestamp).await
    }

    async fn notify_panic(&self, _subject: &Subject, _timestamp: TimeStamp) -> Result<(), AppError> {
        std::future::pending::<()>().await;
        Ok(())
    }

    async fn notify_low_battery(
        &self,
        subject: &Subject,
        level: BatteryLevel,
        timestamp: TimeStamp,
    ) -> Result<(), AppError> {
        self.inner.notify_low_battery(subject, level, timestamp).await
    }

    async fn notify_speeding(&self, event: &DrivingEvent) -> Result<(), AppError> {
        self.inner.notify_speeding(event).await
    }

    async fn notify_harsh_braking(&self, event: &DrivingEvent) -> Result<(), AppError> {
        self.inner.notify_harsh_braking(event).await
    }

    async fn set_current_place(
        &self,
        subject_id: &SubjectId,
        place_name: Option<String>,
    ) -> Result<(), AppError> {
        self.inner.set_current_place(subject_id, place_name).await
    }
}

#[tokio::test]
async fn test_tracker_survives_a_stalled_dispatcher() {
    let recorder = RecordingDispatcher::default();
    let subject_records = SubjectRecords::new();

    let mut mom_in_trouble = sample("mom", Some(5000.0), 0);
    mom_in_trouble.panic_active = true;

    let finished = tokio::time::timeout(
        Duration::from_secs(5),
        run_to_completion(
            vec![
                TrackerMessage::Sample(mom_in_trouble),
                TrackerMessage::Sample(sample("dad", Some(5000.0), 0)),
                TrackerMessage::Sample(sample("dad", Some(0.0), 60)),
            ],
            Arc::new(StalledDispatcher {
                inner: recorder.clone(),
            }),
            InMemoryEventLog::new(),
            subject_records.clone(),
        ),
    )
    .await;

    assert!(finished.is_ok());
    assert!(subject_records
        .get(&SubjectId("dad".to_string()))
        .await
        .is_some());
    assert_eq!(
        recorder.calls(),
        vec![
            Call::CurrentPlace("dad".to_string(), Some("Home".to_string())),
            Call::Arrival("dad".to_string(), "Home".to_string()),
        ]
    );
}
