/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use super::{types::*, utils::seconds_between};
use crate::environment::HistoryConfig;
use rustc_hash::FxHashMap;

/// Keeps a breadcrumb of the local device's own movement, at most one point per interval.
pub struct HistorySampler {
    config: HistoryConfig,
    last_saved: FxHashMap<SubjectId, TimeStamp>,
}

impl HistorySampler {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            config,
            last_saved: FxHashMap::default(),
        }
    }

    pub fn sample(
        &mut self,
        subject_id: &SubjectId,
        location: &Point,
        speed: Option<SpeedInMeterPerSecond>,
        now: TimeStamp,
    ) -> Option<HistoryPoint> {
        if !self.config.enabled {
            return None;
        }

        let due = self.last_saved.get(subject_id).map_or(true, |last_saved| {
            seconds_between(now, *last_saved) > self.config.interval_seconds as f64
        });

        if !due {
            return None;
        }

        self.last_saved.insert(subject_id.to_owned(), now);
        Some(HistoryPoint {
            subject_id: subject_id.to_owned(),
            location: location.to_owned(),
            speed,
            timestamp: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn one_point_per_interval() {
        let mut sampler = HistorySampler::new(HistoryConfig::default());
        let subject_id = SubjectId("alice".to_string());
        let location = Point {
            lat: Latitude(-26.2041),
            lon: Longitude(28.0473),
        };
        let at = |seconds: i64| TimeStamp(Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap());

        assert!(sampler.sample(&subject_id, &location, None, at(0)).is_some());
        assert!(sampler.sample(&subject_id, &location, None, at(120)).is_none());
        assert!(sampler.sample(&subject_id, &location, None, at(300)).is_none());
        assert!(sampler.sample(&subject_id, &location, None, at(301)).is_some());
    }
}
