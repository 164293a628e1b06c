/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use crate::{
    common::{
        types::*,
        utils::{display_name_from_email, is_valid_coordinate},
    },
    domain::{action::enqueue_all, types::internal::location::*},
    environment::AppState,
    tools::error::AppError,
    tracker::TrackerMessage,
};
use actix_web::web::Data;
use chrono::Utc;
use tracing::{debug, warn};

/// Turns a raw report into a sample. A missing or invalid coordinate only drops the
/// location, every other field is still evaluated.
pub fn validate_sample(record: SampleRecord, now: TimeStamp) -> Result<LocationSample, AppError> {
    let SampleRecord {
        subject_id,
        lat,
        lon,
        speed,
        timestamp,
        battery_level,
        panic_active,
        family_id,
        email,
    } = record;

    let subject_id = subject_id.trim().to_string();
    if subject_id.is_empty() {
        return Err(AppError::InvalidRequest(
            "subjectId must not be empty".to_string(),
        ));
    }

    let location = match (lat, lon) {
        (Some(lat), Some(lon)) if is_valid_coordinate(lat, lon) => Some(Point {
            lat: Latitude(lat),
            lon: Longitude(lon),
        }),
        (Some(lat), Some(lon)) => {
            warn!(tag = "[Invalid Coordinate]", subject_id = %subject_id, lat = lat, lon = lon);
            None
        }
        _ => None,
    };

    Ok(LocationSample {
        subject: Subject {
            subject_id: SubjectId(subject_id),
            display_name: display_name_from_email(email.as_deref()),
        },
        location,
        speed: speed.filter(|speed| speed.inner().is_finite() && speed.inner() >= 0.0),
        timestamp: timestamp.unwrap_or(now),
        battery_level: battery_level.map(BatteryLevel),
        panic_active: panic_active.unwrap_or(false),
        family_id: family_id
            .filter(|family_id| !family_id.is_empty())
            .map(FamilyId),
    })
}

pub async fn ingest_samples(
    data: Data<AppState>,
    records: Vec<SampleRecord>,
) -> Result<APISuccess, AppError> {
    if records.len() > data.max_samples_per_request {
        return Err(AppError::TooManySamples(
            records.len(),
            data.max_samples_per_request,
        ));
    }

    let now = TimeStamp(Utc::now());
    let samples = records
        .into_iter()
        .map(|record| validate_sample(record, now))
        .collect::<Result<Vec<LocationSample>, AppError>>()?;

    debug!(tag = "[Samples Received]", count = samples.len());

    enqueue_all(
        &data.sender,
        samples.into_iter().map(TrackerMessage::Sample).collect(),
    )?;

    Ok(APISuccess::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> TimeStamp {
        TimeStamp(Utc.timestamp_opt(1_700_000_000, 0).unwrap())
    }

    #[test]
    fn empty_subject_is_rejected() {
        let record = SampleRecord {
            subject_id: "  ".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            validate_sample(record, now()),
            Err(AppError::InvalidRequest(_))
        ));
    }

    #[test]
    fn out_of_range_coordinate_keeps_the_rest_of_the_sample() {
        let record = SampleRecord {
            subject_id: "mom".to_string(),
            lat: Some(91.0),
            lon: Some(28.0),
            battery_level: Some(12),
            panic_active: Some(true),
            email: Some("mary.jones@example.com".to_string()),
            ..Default::default()
        };
        let sample = validate_sample(record, now()).unwrap();
        assert_eq!(sample.location, None);
        assert_eq!(sample.battery_level, Some(BatteryLevel(12)));
        assert!(sample.panic_active);
        assert_eq!(sample.subject.display_name, "Mary.jones");
        assert_eq!(sample.timestamp, now());
    }

    #[test]
    fn json_report_is_parsed() {
        let record: SampleRecord = serde_json::from_str(
            r#"{"subjectId":"dad","latitude":-26.2041,"longitude":28.0473,"speed":"12.5","familyId":"f1"}"#,
        )
        .unwrap();
        let sample = validate_sample(record, now()).unwrap();
        assert_eq!(
            sample.location,
            Some(Point {
                lat: Latitude(-26.2041),
                lon: Longitude(28.0473)
            })
        );
        assert_eq!(sample.speed, Some(SpeedInMeterPerSecond(12.5)));
        assert_eq!(sample.family_id, Some(FamilyId("f1".to_string())));
        assert_eq!(sample.subject.display_name, "Family Member");
    }
}
