/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use crate::{
    common::types::*,
    outbound::{dispatcher::InMemoryEventLog, records::SubjectRecords},
    tools::logger::LoggerConfig,
    tracker::TrackerMessage,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::Sender;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub workers: usize,
    pub logger_cfg: LoggerConfig,
    pub engine_cfg: EngineConfig,
    pub tracker_queue_size: usize,
    pub tracker_heartbeat_seconds: u64,
    pub dispatch_timeout_millis: u64,
    pub notification_callback_url: Option<String>,
    pub request_timeout: u64,
    pub max_allowed_req_size: usize,
    pub max_samples_per_request: usize,
    pub log_unprocessible_req_body: Vec<String>,
}

/// Identity of the device this service instance tracks on behalf of.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SessionConfig {
    pub self_subject_id: String,
    pub family_id: String,
    pub notify_self_transitions: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GeofenceConfig {
    pub enabled: bool,
    pub exit_buffer_meters: f64,
    pub notification_cooldown_seconds: u64,
}

impl Default for GeofenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            exit_buffer_meters: 100.0,
            notification_cooldown_seconds: 60,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DrivingConfig {
    pub speeding_threshold_mps: f64,
    pub speeding_cooldown_seconds: u64,
    pub harsh_braking_threshold_mps2: f64,
    pub harsh_braking_min_speed_mps: f64,
    pub harsh_braking_max_interval_seconds: f64,
    pub harsh_braking_cooldown_seconds: u64,
}

impl Default for DrivingConfig {
    fn default() -> Self {
        Self {
            speeding_threshold_mps: 33.3,
            speeding_cooldown_seconds: 300,
            harsh_braking_threshold_mps2: 4.5,
            harsh_braking_min_speed_mps: 8.3,
            harsh_braking_max_interval_seconds: 10.0,
            harsh_braking_cooldown_seconds: 60,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MemberAlertConfig {
    pub panic_cooldown_seconds: u64,
    pub low_battery_threshold: i32,
    pub low_battery_cooldown_seconds: u64,
}

impl Default for MemberAlertConfig {
    fn default() -> Self {
        Self {
            panic_cooldown_seconds: 30,
            low_battery_threshold: 15,
            low_battery_cooldown_seconds: 2 * 60 * 60,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HistoryConfig {
    pub enabled: bool,
    pub interval_seconds: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: 5 * 60,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EngineConfig {
    pub session_cfg: SessionConfig,
    pub default_place_radius_meters: f64,
    pub geofence_cfg: GeofenceConfig,
    pub driving_cfg: DrivingConfig,
    pub member_alert_cfg: MemberAlertConfig,
    pub history_cfg: HistoryConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            session_cfg: SessionConfig::default(),
            default_place_radius_meters: 100.0,
            geofence_cfg: GeofenceConfig::default(),
            driving_cfg: DrivingConfig::default(),
            member_alert_cfg: MemberAlertConfig::default(),
            history_cfg: HistoryConfig::default(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub sender: Sender<TrackerMessage>,
    pub subject_records: SubjectRecords,
    pub event_log: InMemoryEventLog,
    pub family_id: FamilyId,
    pub max_samples_per_request: usize,
    pub max_allowed_req_size: usize,
    pub log_unprocessible_req_body: Vec<String>,
    pub request_timeout: u64,
}

impl AppState {
    pub fn new(
        app_config: &AppConfig,
        sender: Sender<TrackerMessage>,
        subject_records: SubjectRecords,
        event_log: InMemoryEventLog,
    ) -> AppState {
        AppState {
            sender,
            subject_records,
            event_log,
            family_id: FamilyId(app_config.engine_cfg.session_cfg.family_id.to_owned()),
            max_samples_per_request: app_config.max_samples_per_request,
            max_allowed_req_size: app_config.max_allowed_req_size,
            log_unprocessible_req_body: app_config.log_unprocessible_req_body.to_owned(),
            request_timeout: app_config.request_timeout,
        }
    }
}
