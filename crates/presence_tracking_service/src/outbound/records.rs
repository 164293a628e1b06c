/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use crate::common::types::*;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared presence records of every family member seen by this service.
#[derive(Clone, Default)]
pub struct SubjectRecords {
    records: Arc<RwLock<FxHashMap<SubjectId, SubjectRecord>>>,
}

impl SubjectRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the latest position, speed and battery of the sample. Fields the sample
    /// does not carry keep their previous value, `current_place` is never touched here.
    pub async fn record_sample(&self, sample: &LocationSample) {
        let mut records = self.records.write().await;
        let subject_id = &sample.subject.subject_id;

        match records.get_mut(subject_id) {
            Some(record) => {
                record.display_name = sample.subject.display_name.to_owned();
                record.last_location = sample.location.to_owned().or(record.last_location.take());
                record.last_speed = sample.speed.or(record.last_speed);
                record.battery_level = sample.battery_level.or(record.battery_level);
                record.panic_active = sample.panic_active;
                record.last_updated = sample.timestamp;
            }
            None => {
                records.insert(
                    subject_id.to_owned(),
                    SubjectRecord {
                        subject_id: subject_id.to_owned(),
                        display_name: sample.subject.display_name.to_owned(),
                        current_place: None,
                        last_location: sample.location.to_owned(),
                        last_speed: sample.speed,
                        battery_level: sample.battery_level,
                        panic_active: sample.panic_active,
                        last_updated: sample.timestamp,
                    },
                );
            }
        }
    }

    /// Returns false when the subject has no record yet.
    pub async fn set_current_place(&self, subject_id: &SubjectId, place_name: Option<String>) -> bool {
        match self.records.write().await.get_mut(subject_id) {
            Some(record) => {
                record.current_place = place_name;
                true
            }
            None => false,
        }
    }

    pub async fn get(&self, subject_id: &SubjectId) -> Option<SubjectRecord> {
        self.records.read().await.get(subject_id).cloned()
    }
}
