/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use super::types::{PresenceKey, SubjectId, TimeStamp};
use chrono::Duration;
use rustc_hash::FxHashMap;
use std::fmt;
use strum_macros::Display;

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[strum(serialize_all = "lowercase")]
pub enum AlertTag {
    Panic,
    Battery,
    Speeding,
    Braking,
}

/// Key of a cooldown. Renders as `"{subject}_{place}"` or `"{subject}_{alert}"`, but
/// presence and alert keys never share an entry, whatever the ids contain.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum DebounceTag {
    Presence(PresenceKey),
    Alert(SubjectId, AlertTag),
}

impl DebounceTag {
    pub fn panic(subject_id: &SubjectId) -> Self {
        DebounceTag::Alert(subject_id.to_owned(), AlertTag::Panic)
    }

    pub fn battery(subject_id: &SubjectId) -> Self {
        DebounceTag::Alert(subject_id.to_owned(), AlertTag::Battery)
    }

    pub fn speeding(subject_id: &SubjectId) -> Self {
        DebounceTag::Alert(subject_id.to_owned(), AlertTag::Speeding)
    }

    pub fn braking(subject_id: &SubjectId) -> Self {
        DebounceTag::Alert(subject_id.to_owned(), AlertTag::Braking)
    }
}

impl fmt::Display for DebounceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DebounceTag::Presence(key) => write!(f, "{key}"),
            DebounceTag::Alert(subject_id, alert) => write!(f, "{}_{alert}", subject_id.0),
        }
    }
}

/// Last-fired timestamps of notifications.
pub trait DebounceStore: Send {
    fn last_notified(&self, tag: &DebounceTag) -> Option<TimeStamp>;

    fn mark_notified(&mut self, tag: &DebounceTag, at: TimeStamp);

    /// Returns true, and records `now`, when nothing fired for `tag` within `cooldown`.
    fn should_notify(&mut self, tag: &DebounceTag, cooldown: Duration, now: TimeStamp) -> bool {
        let allowed = match self.last_notified(tag) {
            Some(TimeStamp(last)) => now.inner() - last > cooldown,
            None => true,
        };
        if allowed {
            self.mark_notified(tag, now);
        }
        allowed
    }
}

#[derive(Debug, Default)]
pub struct InMemoryDebounceStore {
    last_fired: FxHashMap<DebounceTag, TimeStamp>,
}

impl InMemoryDebounceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DebounceStore for InMemoryDebounceStore {
    fn last_notified(&self, tag: &DebounceTag) -> Option<TimeStamp> {
        self.last_fired.get(tag).copied()
    }

    fn mark_notified(&mut self, tag: &DebounceTag, at: TimeStamp) {
        self.last_fired.insert(tag.to_owned(), at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::PlaceId;
    use chrono::{TimeZone, Utc};

    fn at(seconds: i64) -> TimeStamp {
        TimeStamp(Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap())
    }

    fn presence(subject_id: &str, place_id: &str) -> DebounceTag {
        DebounceTag::Presence(PresenceKey {
            subject_id: SubjectId(subject_id.to_string()),
            place_id: PlaceId(place_id.to_string()),
        })
    }

    #[test]
    fn first_notification_is_always_allowed() {
        let mut store = InMemoryDebounceStore::new();
        let tag = presence("alice", "home");
        assert!(store.should_notify(&tag, Duration::seconds(60), at(0)));
        assert_eq!(store.last_notified(&tag), Some(at(0)));
    }

    #[test]
    fn suppressed_within_cooldown_and_does_not_extend_it() {
        let mut store = InMemoryDebounceStore::new();
        let tag = presence("alice", "home");
        assert!(store.should_notify(&tag, Duration::seconds(60), at(0)));
        assert!(!store.should_notify(&tag, Duration::seconds(60), at(30)));
        assert!(!store.should_notify(&tag, Duration::seconds(60), at(60)));
        assert_eq!(store.last_notified(&tag), Some(at(0)));
        assert!(store.should_notify(&tag, Duration::seconds(60), at(61)));
    }

    #[test]
    fn tags_are_independent() {
        let mut store = InMemoryDebounceStore::new();
        let alice = SubjectId("alice".to_string());
        assert!(store.should_notify(&DebounceTag::panic(&alice), Duration::seconds(30), at(0)));
        assert!(store.should_notify(&DebounceTag::battery(&alice), Duration::seconds(30), at(1)));
    }

    #[test]
    fn tags_render_as_subject_and_suffix() {
        let alice = SubjectId("alice".to_string());
        assert_eq!(presence("alice", "home").to_string(), "alice_home");
        assert_eq!(DebounceTag::panic(&alice).to_string(), "alice_panic");
        assert_eq!(DebounceTag::braking(&alice).to_string(), "alice_braking");
    }

    #[test]
    fn lookalike_tags_keep_separate_cooldowns() {
        let mut store = InMemoryDebounceStore::new();
        let alice = SubjectId("alice".to_string());
        let cooldown = Duration::seconds(60);

        // a place called "panic" renders like the panic alert tag
        assert_eq!(presence("alice", "panic").to_string(), DebounceTag::panic(&alice).to_string());
        assert!(store.should_notify(&presence("alice", "panic"), cooldown, at(0)));
        assert!(store.should_notify(&DebounceTag::panic(&alice), cooldown, at(1)));

        // "a_b" at "c" and "a" at "b_c" both render as "a_b_c"
        assert!(store.should_notify(&presence("a_b", "c"), cooldown, at(0)));
        assert!(store.should_notify(&presence("a", "b_c"), cooldown, at(1)));
    }
}
