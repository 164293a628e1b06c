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
};
use crate::environment::MemberAlertConfig;
use chrono::Duration;
use tracing::info;

/// Panic and low battery alerts raised about other family members.
pub struct MemberAlertEvaluator {
    config: MemberAlertConfig,
}

impl MemberAlertEvaluator {
    pub fn new(config: MemberAlertConfig) -> Self {
        Self { config }
    }

    pub fn evaluate<D>(&self, debounce: &mut D, sample: &LocationSample, now: TimeStamp) -> Vec<MemberAlert>
    where
        D: DebounceStore + ?Sized,
    {
        let subject = &sample.subject;
        let mut alerts = Vec::new();

        if sample.panic_active
            && debounce.should_notify(
                &DebounceTag::panic(&subject.subject_id),
                Duration::seconds(self.config.panic_cooldown_seconds as i64),
                now,
            )
        {
            info!(tag = "[Panic Alert]", subject_id = %subject.subject_id.0);
            alerts.push(MemberAlert::Panic {
                subject: subject.to_owned(),
                timestamp: now,
            });
        }

        if let Some(level) = sample.battery_level {
            if level.inner() >= 1
                && level.inner() <= self.config.low_battery_threshold
                && debounce.should_notify(
                    &DebounceTag::battery(&subject.subject_id),
                    Duration::seconds(self.config.low_battery_cooldown_seconds as i64),
                    now,
                )
            {
                info!(tag = "[Low Battery Alert]", subject_id = %subject.subject_id.0, level = level.inner());
                alerts.push(MemberAlert::LowBattery {
                    subject: subject.to_owned(),
                    level,
                    timestamp: now,
                });
            }
        }

        alerts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::debounce::InMemoryDebounceStore;
    use chrono::{TimeZone, Utc};

    fn at(seconds: i64) -> TimeStamp {
        TimeStamp(Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap())
    }

    fn sample(battery_level: Option<i32>, panic_active: bool) -> LocationSample {
        LocationSample {
            subject: Subject {
                subject_id: SubjectId("bob".to_string()),
                display_name: "Bob".to_string(),
            },
            location: None,
            speed: None,
            timestamp: at(0),
            battery_level: battery_level.map(BatteryLevel),
            panic_active,
            family_id: None,
        }
    }

    #[test]
    fn panic_repeats_after_thirty_seconds() {
        let evaluator = MemberAlertEvaluator::new(MemberAlertConfig::default());
        let mut debounce = InMemoryDebounceStore::new();

        assert_eq!(evaluator.evaluate(&mut debounce, &sample(None, true), at(0)).len(), 1);
        assert!(evaluator.evaluate(&mut debounce, &sample(None, true), at(20)).is_empty());
        assert_eq!(evaluator.evaluate(&mut debounce, &sample(None, true), at(31)).len(), 1);
    }

    #[test]
    fn low_battery_only_within_range() {
        let evaluator = MemberAlertEvaluator::new(MemberAlertConfig::default());
        let mut debounce = InMemoryDebounceStore::new();

        assert!(evaluator.evaluate(&mut debounce, &sample(Some(0), false), at(0)).is_empty());
        assert!(evaluator.evaluate(&mut debounce, &sample(Some(16), false), at(0)).is_empty());
        assert!(evaluator.evaluate(&mut debounce, &sample(None, false), at(0)).is_empty());

        let alerts = evaluator.evaluate(&mut debounce, &sample(Some(15), false), at(0));
        assert!(matches!(
            alerts.as_slice(),
            [MemberAlert::LowBattery { level: BatteryLevel(15), .. }]
        ));
    }

    #[test]
    fn low_battery_waits_two_hours_between_alerts() {
        let evaluator = MemberAlertEvaluator::new(MemberAlertConfig::default());
        let mut debounce = InMemoryDebounceStore::new();

        assert_eq!(evaluator.evaluate(&mut debounce, &sample(Some(10), false), at(0)).len(), 1);
        assert!(evaluator
            .evaluate(&mut debounce, &sample(Some(5), false), at(7_200))
            .is_empty());
        assert_eq!(
            evaluator
                .evaluate(&mut debounce, &sample(Some(5), false), at(7_201))
                .len(),
            1
        );
    }
}
