/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use strum_macros::{Display, EnumString};

#[derive(Deserialize, Serialize, Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
#[macros::impl_getter]
pub struct SubjectId(pub String);
#[derive(Deserialize, Serialize, Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
#[macros::impl_getter]
pub struct PlaceId(pub String);
#[derive(Deserialize, Serialize, Clone, Debug, Eq, Hash, PartialEq)]
#[macros::impl_getter]
pub struct FamilyId(pub String);
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Copy)]
#[macros::impl_getter]
pub struct Latitude(pub f64);
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Copy)]
#[macros::impl_getter]
pub struct Longitude(pub f64);
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, PartialOrd, Copy)]
#[macros::impl_getter]
pub struct Radius(pub f64);
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Hash, Ord)]
#[macros::impl_getter]
pub struct TimeStamp(pub DateTime<Utc>);
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[macros::impl_getter]
pub struct BatteryLevel(pub i32);
#[derive(Serialize, Clone, Debug, PartialEq, PartialOrd, Copy)]
#[macros::impl_getter]
pub struct SpeedInMeterPerSecond(pub f64);

impl SpeedInMeterPerSecond {
    pub fn to_kmph(self) -> f64 {
        self.0 * 3.6
    }
}

impl<'de> Deserialize<'de> for SpeedInMeterPerSecond {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{Error, Unexpected};

        struct SpeedVisitor;

        #[allow(clippy::needless_lifetimes)]
        impl<'de> serde::de::Visitor<'de> for SpeedVisitor {
            type Value = SpeedInMeterPerSecond;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str(
                    "a number (integer/float) or a string containing a floating-point number",
                )
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
            where
                E: Error,
            {
                Ok(SpeedInMeterPerSecond(value))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E> {
                Ok(SpeedInMeterPerSecond(v as f64))
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
                Ok(SpeedInMeterPerSecond(v as f64))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: Error,
            {
                value
                    .parse::<f64>()
                    .map(SpeedInMeterPerSecond)
                    .map_err(|_| Error::invalid_value(Unexpected::Str(value), &self))
            }
        }

        deserializer.deserialize_any(SpeedVisitor)
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Point {
    pub lat: Latitude,
    pub lon: Longitude,
}

/// A named circular geofence belonging to a family.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: PlaceId,
    pub name: String,
    pub center: Point,
    pub radius: Radius,
}

/// Place as it arrives from shared group storage, before validation.
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct PlaceRecord {
    pub id: String,
    pub name: Option<String>,
    #[serde(alias = "latitude")]
    pub lat: Option<f64>,
    #[serde(alias = "longitude")]
    pub lon: Option<f64>,
    pub radius: Option<f64>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub subject_id: SubjectId,
    pub display_name: String,
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct PresenceKey {
    pub subject_id: SubjectId,
    pub place_id: PlaceId,
}

impl fmt::Display for PresenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.subject_id.0, self.place_id.0)
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PresenceEntry {
    pub is_inside: bool,
    pub initial_state_resolved: bool,
}

/// A validated location sample, ready for evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct LocationSample {
    pub subject: Subject,
    pub location: Option<Point>,
    pub speed: Option<SpeedInMeterPerSecond>,
    pub timestamp: TimeStamp,
    pub battery_level: Option<BatteryLevel>,
    pub panic_active: bool,
    pub family_id: Option<FamilyId>,
}

#[derive(Debug, Clone, Copy, EnumString, Display, Serialize, Deserialize, Eq, Hash, PartialEq)]
pub enum TransitionKind {
    #[strum(serialize = "ARRIVED")]
    #[serde(rename = "ARRIVED")]
    Arrived,
    #[strum(serialize = "LEFT")]
    #[serde(rename = "LEFT")]
    Left,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransitionEvent {
    pub subject: Subject,
    pub place: Place,
    pub kind: TransitionKind,
    pub timestamp: TimeStamp,
}

#[derive(Debug, Clone, Copy, EnumString, Display, Serialize, Deserialize, Eq, Hash, PartialEq)]
pub enum DrivingEventKind {
    #[strum(serialize = "SPEEDING")]
    #[serde(rename = "SPEEDING")]
    Speeding,
    #[strum(serialize = "HARSH_BRAKING")]
    #[serde(rename = "HARSH_BRAKING")]
    HarshBraking,
}

/// `value` is km/h for speeding and m/s^2 of deceleration for harsh braking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DrivingEvent {
    pub subject_id: SubjectId,
    pub kind: DrivingEventKind,
    pub value: f64,
    pub timestamp: TimeStamp,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberAlert {
    Panic {
        subject: Subject,
        timestamp: TimeStamp,
    },
    LowBattery {
        subject: Subject,
        level: BatteryLevel,
        timestamp: TimeStamp,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPoint {
    pub subject_id: SubjectId,
    pub location: Point,
    pub speed: Option<SpeedInMeterPerSecond>,
    pub timestamp: TimeStamp,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// `notify` is false for the local subject's own transitions unless
    /// self notifications are switched on. `currentPlace` is written either way.
    Transition {
        event: TransitionEvent,
        notify: bool,
    },
    Driving(DrivingEvent),
    Alert(MemberAlert),
    History(HistoryPoint),
}

/// The shared presence record of a family member.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRecord {
    pub subject_id: SubjectId,
    pub display_name: String,
    pub current_place: Option<String>,
    pub last_location: Option<Point>,
    pub last_speed: Option<SpeedInMeterPerSecond>,
    pub battery_level: Option<BatteryLevel>,
    pub panic_active: bool,
    pub last_updated: TimeStamp,
}

#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct APISuccess {
    result: String,
}

impl Default for APISuccess {
    fn default() -> Self {
        Self {
            result: "Success".to_string(),
        }
    }
}
