/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use super::{
    debounce::{DebounceStore, DebounceTag},
    types::*,
    utils::seconds_between,
};
use crate::environment::DrivingConfig;
use chrono::Duration;
use rustc_hash::FxHashMap;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy)]
struct SpeedSample {
    speed: SpeedInMeterPerSecond,
    timestamp: TimeStamp,
}

/// Detects speeding and harsh braking from consecutive speed samples of a subject.
pub struct DrivingEventEvaluator {
    config: DrivingConfig,
    last_samples: FxHashMap<SubjectId, SpeedSample>,
}

impl DrivingEventEvaluator {
    pub fn new(config: DrivingConfig) -> Self {
        Self {
            config,
            last_samples: FxHashMap::default(),
        }
    }

    pub fn evaluate<D>(
        &mut self,
        debounce: &mut D,
        subject_id: &SubjectId,
        speed: SpeedInMeterPerSecond,
        timestamp: TimeStamp,
    ) -> Vec<DrivingEvent>
    where
        D: DebounceStore + ?Sized,
    {
        let mut events = Vec::new();

        if speed.inner() > self.config.speeding_threshold_mps
            && debounce.should_notify(
                &DebounceTag::speeding(subject_id),
                Duration::seconds(self.config.speeding_cooldown_seconds as i64),
                timestamp,
            )
        {
            info!(tag = "[Speeding Detected]", subject_id = %subject_id.0, speed = speed.inner());
            events.push(DrivingEvent {
                subject_id: subject_id.to_owned(),
                kind: DrivingEventKind::Speeding,
                value: speed.to_kmph().trunc(),
                timestamp,
            });
        }

        if let Some(deceleration) = self
            .last_samples
            .get(subject_id)
            .and_then(|previous| self.deceleration(previous, speed, timestamp))
        {
            if deceleration > self.config.harsh_braking_threshold_mps2
                && debounce.should_notify(
                    &DebounceTag::braking(subject_id),
                    Duration::seconds(self.config.harsh_braking_cooldown_seconds as i64),
                    timestamp,
                )
            {
                info!(tag = "[Harsh Braking Detected]", subject_id = %subject_id.0, deceleration = deceleration);
                events.push(DrivingEvent {
                    subject_id: subject_id.to_owned(),
                    kind: DrivingEventKind::HarshBraking,
                    value: deceleration,
                    timestamp,
                });
            }
        }

        self.last_samples
            .insert(subject_id.to_owned(), SpeedSample { speed, timestamp });

        events
    }

    /// Deceleration in m/s^2 against the previous sample, when the previous sample
    /// was fast enough and the gap between the two is a plausible fix interval.
    fn deceleration(
        &self,
        previous: &SpeedSample,
        speed: SpeedInMeterPerSecond,
        timestamp: TimeStamp,
    ) -> Option<f64> {
        if previous.speed.inner() <= self.config.harsh_braking_min_speed_mps {
            return None;
        }

        let delta_seconds = seconds_between(timestamp, previous.timestamp);
        if delta_seconds <= 0.0 || delta_seconds > self.config.harsh_braking_max_interval_seconds {
            debug!(tag = "[Driving Sample Gap Discarded]", delta_seconds = delta_seconds);
            return None;
        }

        Some((previous.speed.inner() - speed.inner()) / delta_seconds)
    }
}
