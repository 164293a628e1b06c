/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use super::{
    debounce::{DebounceStore, DebounceTag},
    place_registry::PlaceRegistry,
    presence::PresenceStore,
    types::*,
    utils::distance_between_in_meters,
};
use crate::environment::GeofenceConfig;
use chrono::Duration;
use tracing::{debug, info};

pub struct GeofenceEvaluator {
    config: GeofenceConfig,
}

impl GeofenceEvaluator {
    pub fn new(config: GeofenceConfig) -> Self {
        Self { config }
    }

    /// Updates the subject's presence for every registered place and returns the
    /// arrivals and departures that should be announced.
    ///
    /// The first evaluation of a (subject, place) pair only records the state, so a
    /// restart never replays arrivals for places the subject is already inside.
    /// An exit is only confirmed once the subject is further than `radius + exit_buffer`
    /// from the center; inside that band the previous state is kept.
    pub fn evaluate<P, D>(
        &self,
        presence: &mut P,
        debounce: &mut D,
        registry: &PlaceRegistry,
        subject: &Subject,
        location: &Point,
        now: TimeStamp,
    ) -> Vec<TransitionEvent>
    where
        P: PresenceStore + ?Sized,
        D: DebounceStore + ?Sized,
    {
        if !self.config.enabled {
            return Vec::new();
        }

        let cooldown = Duration::seconds(self.config.notification_cooldown_seconds as i64);
        let mut events = Vec::new();

        for place in registry.all() {
            let key = PresenceKey {
                subject_id: subject.subject_id.to_owned(),
                place_id: place.id.to_owned(),
            };
            let tag = DebounceTag::Presence(key.to_owned());
            let distance = distance_between_in_meters(location, &place.center);
            let is_inside = distance <= place.radius.inner();
            let entry = presence.entry(&key);

            debug!(
                tag = "[Geofence Check]",
                subject_id = %subject.subject_id.0,
                place = %place.name,
                distance = distance,
                is_inside = %is_inside
            );

            if is_inside && !entry.is_inside {
                if !entry.initial_state_resolved {
                    debug!(tag = "[Geofence Startup Sync]", subject_id = %subject.subject_id.0, place = %place.name);
                } else if debounce.should_notify(&tag, cooldown, now) {
                    info!(tag = "[Geofence Entry]", subject_id = %subject.subject_id.0, place = %place.name);
                    events.push(TransitionEvent {
                        subject: subject.to_owned(),
                        place: place.to_owned(),
                        kind: TransitionKind::Arrived,
                        timestamp: now,
                    });
                } else {
                    debug!(tag = "[Geofence Entry Debounced]", subject_id = %subject.subject_id.0, place = %place.name);
                }
                presence.mark_resolved(&key);
                presence.set_inside(&key, true);
            } else if !is_inside && entry.is_inside {
                if distance > place.radius.inner() + self.config.exit_buffer_meters {
                    presence.mark_resolved(&key);
                    if debounce.should_notify(&tag, cooldown, now) {
                        info!(tag = "[Geofence Exit]", subject_id = %subject.subject_id.0, place = %place.name);
                        events.push(TransitionEvent {
                            subject: subject.to_owned(),
                            place: place.to_owned(),
                            kind: TransitionKind::Left,
                            timestamp: now,
                        });
                    } else {
                        debug!(tag = "[Geofence Exit Debounced]", subject_id = %subject.subject_id.0, place = %place.name);
                    }
                    presence.set_inside(&key, false);
                }
            } else if !entry.initial_state_resolved {
                presence.mark_resolved(&key);
            }
        }

        events
    }
}
