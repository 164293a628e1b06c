/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use crate::common::types::*;
use serde::Serialize;
use strum_macros::Display;

#[derive(Debug, Clone, Copy, Serialize, Display, PartialEq, Eq)]
pub enum AlertKind {
    #[strum(serialize = "ARRIVED")]
    #[serde(rename = "ARRIVED")]
    Arrived,
    #[strum(serialize = "LEFT")]
    #[serde(rename = "LEFT")]
    Left,
    #[strum(serialize = "PANIC")]
    #[serde(rename = "PANIC")]
    Panic,
    #[strum(serialize = "LOW_BATTERY")]
    #[serde(rename = "LOW_BATTERY")]
    LowBattery,
    #[strum(serialize = "SPEEDING")]
    #[serde(rename = "SPEEDING")]
    Speeding,
    #[strum(serialize = "HARSH_BRAKING")]
    #[serde(rename = "HARSH_BRAKING")]
    HarshBraking,
}

/// Payload posted to the notification callback for every user visible alert.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlertCallbackRequest {
    pub kind: AlertKind,
    pub subject_id: SubjectId,
    pub subject_name: Option<String>,
    pub title: String,
    pub message: String,
    pub place_id: Option<PlaceId>,
    pub place_name: Option<String>,
    pub battery_level: Option<BatteryLevel>,
    pub value: Option<f64>,
    pub timestamp: TimeStamp,
}

impl AlertCallbackRequest {
    pub fn arrival(subject: &Subject, place: &Place, timestamp: TimeStamp) -> Self {
        Self {
            kind: AlertKind::Arrived,
            subject_id: subject.subject_id.to_owned(),
            subject_name: Some(subject.display_name.to_owned()),
            title: "Family Alert".to_string(),
            message: format!("{} arrived at {}", subject.display_name, place.name),
            place_id: Some(place.id.to_owned()),
            place_name: Some(place.name.to_owned()),
            battery_level: None,
            value: None,
            timestamp,
        }
    }

    pub fn departure(subject: &Subject, place: &Place, timestamp: TimeStamp) -> Self {
        Self {
            kind: AlertKind::Left,
            message: format!("{} left {}", subject.display_name, place.name),
            ..Self::arrival(subject, place, timestamp)
        }
    }

    pub fn panic(subject: &Subject, timestamp: TimeStamp) -> Self {
        Self {
            kind: AlertKind::Panic,
            subject_id: subject.subject_id.to_owned(),
            subject_name: Some(subject.display_name.to_owned()),
            title: format!("EMERGENCY: {} needs help!", subject.display_name),
            message: "SOS Panic Button pressed. Check their location immediately.".to_string(),
            place_id: None,
            place_name: None,
            battery_level: None,
            value: None,
            timestamp,
        }
    }

    pub fn low_battery(subject: &Subject, level: BatteryLevel, timestamp: TimeStamp) -> Self {
        Self {
            kind: AlertKind::LowBattery,
            title: format!("Low Battery: {}", subject.display_name),
            message: format!(
                "{}'s phone is at {}%. They might go offline soon.",
                subject.display_name,
                level.inner()
            ),
            battery_level: Some(level),
            ..Self::panic(subject, timestamp)
        }
    }

    pub fn driving(event: &DrivingEvent) -> Self {
        let (kind, message) = match event.kind {
            DrivingEventKind::Speeding => (AlertKind::Speeding, format!("{} km/h", event.value)),
            DrivingEventKind::HarshBraking => (
                AlertKind::HarshBraking,
                format!("Decel: {:.1} m/s²", event.value),
            ),
        };
        Self {
            kind,
            subject_id: event.subject_id.to_owned(),
            subject_name: None,
            title: "Driving Alert".to_string(),
            message,
            place_id: None,
            place_name: None,
            battery_level: None,
            value: Some(event.value),
            timestamp: event.timestamp,
        }
    }
}
