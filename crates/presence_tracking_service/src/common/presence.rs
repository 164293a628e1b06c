/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use super::types::*;
use rustc_hash::FxHashMap;

/// Per (subject, place) inside/outside bookkeeping used by the geofence evaluator.
/// Absent keys read as outside and unresolved.
pub trait PresenceStore: Send {
    fn entry(&self, key: &PresenceKey) -> PresenceEntry;

    fn set_inside(&mut self, key: &PresenceKey, is_inside: bool);

    fn mark_resolved(&mut self, key: &PresenceKey);

    /// Places the subject is currently considered inside of.
    fn inside_places(&self, subject_id: &SubjectId) -> Vec<PlaceId>;
}

#[derive(Debug, Default)]
pub struct InMemoryPresenceStore {
    entries: FxHashMap<PresenceKey, PresenceEntry>,
}

impl InMemoryPresenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PresenceStore for InMemoryPresenceStore {
    fn entry(&self, key: &PresenceKey) -> PresenceEntry {
        self.entries.get(key).copied().unwrap_or_default()
    }

    fn set_inside(&mut self, key: &PresenceKey, is_inside: bool) {
        self.entries.entry(key.to_owned()).or_default().is_inside = is_inside;
    }

    fn mark_resolved(&mut self, key: &PresenceKey) {
        self.entries
            .entry(key.to_owned())
            .or_default()
            .initial_state_resolved = true;
    }

    fn inside_places(&self, subject_id: &SubjectId) -> Vec<PlaceId> {
        let mut places: Vec<PlaceId> = self
            .entries
            .iter()
            .filter(|(key, entry)| &key.subject_id == subject_id && entry.is_inside)
            .map(|(key, _)| key.place_id.to_owned())
            .collect();
        places.sort();
        places
    }
}
