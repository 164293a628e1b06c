/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use super::{
    alerts::MemberAlertEvaluator,
    debounce::{DebounceStore, InMemoryDebounceStore},
    driving::DrivingEventEvaluator,
    geofence::GeofenceEvaluator,
    history::HistorySampler,
    place_registry::{places_from_records, PlaceRegistry},
    presence::{InMemoryPresenceStore, PresenceStore},
    types::*,
};
use crate::environment::{EngineConfig, SessionConfig};
use tracing::{debug, info};

/// Routes validated samples through every evaluator of a single family session.
///
/// The engine is not thread safe; callers serialize samples, which the tracker
/// does by being the only consumer of the sample channel.
pub struct PresenceEngine<P = InMemoryPresenceStore, D = InMemoryDebounceStore> {
    session: SessionConfig,
    default_place_radius: Radius,
    registry: PlaceRegistry,
    presence: P,
    debounce: D,
    geofence: GeofenceEvaluator,
    driving: DrivingEventEvaluator,
    alerts: MemberAlertEvaluator,
    history: HistorySampler,
}

impl PresenceEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_stores(
            config,
            InMemoryPresenceStore::new(),
            InMemoryDebounceStore::new(),
        )
    }
}

impl<P, D> PresenceEngine<P, D>
where
    P: PresenceStore,
    D: DebounceStore,
{
    pub fn with_stores(config: EngineConfig, presence: P, debounce: D) -> Self {
        Self {
            session: config.session_cfg,
            default_place_radius: Radius(config.default_place_radius_meters),
            registry: PlaceRegistry::new(),
            presence,
            debounce,
            geofence: GeofenceEvaluator::new(config.geofence_cfg),
            driving: DrivingEventEvaluator::new(config.driving_cfg),
            alerts: MemberAlertEvaluator::new(config.member_alert_cfg),
            history: HistorySampler::new(config.history_cfg),
        }
    }

    pub fn session(&self) -> &SessionConfig {
        &self.session
    }

    pub fn places(&self) -> &PlaceRegistry {
        &self.registry
    }

    /// Replaces the whole place set and returns how many places survived validation.
    pub fn replace_places(&mut self, records: Vec<PlaceRecord>) -> usize {
        let received = records.len();
        let places = places_from_records(records, self.default_place_radius);
        let accepted = places.len();
        self.registry.replace_all(places);
        info!(tag = "[Places Replaced]", received = received, accepted = accepted);
        accepted
    }

    pub fn inside_places(&self, subject_id: &SubjectId) -> Vec<PlaceId> {
        self.presence.inside_places(subject_id)
    }

    pub fn is_self(&self, subject_id: &SubjectId) -> bool {
        subject_id.0 == self.session.self_subject_id
    }

    /// The local device is always tracked. Everyone else must carry this session's family id.
    pub fn accepts(&self, sample: &LocationSample) -> bool {
        if self.is_self(&sample.subject.subject_id) {
            return true;
        }
        matches!(&sample.family_id, Some(FamilyId(family_id)) if *family_id == self.session.family_id)
    }

    pub fn process(&mut self, sample: &LocationSample, now: TimeStamp) -> Vec<EngineEvent> {
        if !self.accepts(sample) {
            debug!(tag = "[Sample From Other Family]", subject_id = %sample.subject.subject_id.0);
            return Vec::new();
        }

        let subject_id = &sample.subject.subject_id;
        let is_self = self.is_self(subject_id);
        let mut events = Vec::new();

        if is_self {
            if let Some(speed) = sample.speed {
                events.extend(
                    self.driving
                        .evaluate(&mut self.debounce, subject_id, speed, sample.timestamp)
                        .into_iter()
                        .map(EngineEvent::Driving),
                );
            }
        } else {
            events.extend(
                self.alerts
                    .evaluate(&mut self.debounce, sample, now)
                    .into_iter()
                    .map(EngineEvent::Alert),
            );
        }

        if let Some(location) = &sample.location {
            let notify = !is_self || self.session.notify_self_transitions;
            events.extend(
                self.geofence
                    .evaluate(
                        &mut self.presence,
                        &mut self.debounce,
                        &self.registry,
                        &sample.subject,
                        location,
                        now,
                    )
                    .into_iter()
                    .map(|event| EngineEvent::Transition { event, notify }),
            );

            if is_self {
                if let Some(point) =
                    self.history
                        .sample(subject_id, location, sample.speed, sample.timestamp)
                {
                    events.push(EngineEvent::History(point));
                }
            }
        }

        events
    }
}
