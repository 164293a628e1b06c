/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use super::{types::*, utils::is_valid_coordinate};
use rustc_hash::FxHashMap;
use tracing::warn;

/// In-memory cache of the family's geofences. Always replaced wholesale.
#[derive(Debug, Default, Clone)]
pub struct PlaceRegistry {
    places: Vec<Place>,
    index: FxHashMap<PlaceId, usize>,
}

impl PlaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swaps in the full set of places. A repeated id keeps the last occurrence.
    pub fn replace_all(&mut self, places: Vec<Place>) {
        let mut deduplicated: Vec<Place> = Vec::with_capacity(places.len());
        let mut index: FxHashMap<PlaceId, usize> = FxHashMap::default();

        for place in places {
            match index.get(&place.id) {
                Some(&position) => deduplicated[position] = place,
                None => {
                    index.insert(place.id.to_owned(), deduplicated.len());
                    deduplicated.push(place);
                }
            }
        }

        self.places = deduplicated;
        self.index = index;
    }

    pub fn get(&self, place_id: &PlaceId) -> Option<&Place> {
        self.index
            .get(place_id)
            .and_then(|position| self.places.get(*position))
    }

    pub fn all(&self) -> impl Iterator<Item = &Place> {
        self.places.iter()
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

/// Validates raw place records. Records without a name or a usable center are
/// skipped, a missing or non-positive radius falls back to `default_radius`.
pub fn places_from_records(records: Vec<PlaceRecord>, default_radius: Radius) -> Vec<Place> {
    records
        .into_iter()
        .filter_map(|record| {
            let (Some(name), Some(lat), Some(lon)) = (record.name, record.lat, record.lon) else {
                warn!(tag = "[Place Skipped]", place_id = %record.id, "Missing name or center");
                return None;
            };

            if record.id.is_empty() || !is_valid_coordinate(lat, lon) {
                warn!(tag = "[Place Skipped]", place_id = %record.id, lat = %lat, lon = %lon, "Invalid id or center");
                return None;
            }

            let radius = record
                .radius
                .filter(|radius| radius.is_finite() && *radius > 0.0)
                .map(Radius)
                .unwrap_or(default_radius);

            Some(Place {
                id: PlaceId(record.id),
                name,
                center: Point {
                    lat: Latitude(lat),
                    lon: Longitude(lon),
                },
                radius,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, name: Option<&str>, lat: Option<f64>, radius: Option<f64>) -> PlaceRecord {
        PlaceRecord {
            id: id.to_string(),
            name: name.map(str::to_string),
            lat,
            lon: Some(28.0473),
            radius,
        }
    }

    #[test]
    fn skips_places_without_name_or_center() {
        let places = places_from_records(
            vec![
                record("home", Some("Home"), Some(-26.2041), Some(200.0)),
                record("nameless", None, Some(-26.2041), Some(200.0)),
                record("nowhere", Some("Nowhere"), None, Some(200.0)),
            ],
            Radius(100.0),
        );

        assert_eq!(places.len(), 1);
        assert_eq!(places[0].id, PlaceId("home".to_string()));
    }

    #[test]
    fn missing_radius_falls_back_to_default() {
        let places = places_from_records(
            vec![
                record("school", Some("School"), Some(-26.1), None),
                record("gym", Some("Gym"), Some(-26.1), Some(-5.0)),
            ],
            Radius(100.0),
        );

        assert!(places.iter().all(|place| place.radius == Radius(100.0)));
    }

    #[test]
    fn replace_all_drops_previous_places() {
        let mut registry = PlaceRegistry::new();
        registry.replace_all(places_from_records(
            vec![record("home", Some("Home"), Some(-26.2), Some(200.0))],
            Radius(100.0),
        ));
        registry.replace_all(places_from_records(
            vec![
                record("work", Some("Work"), Some(-26.1), Some(150.0)),
                record("work", Some("Office"), Some(-26.1), Some(150.0)),
            ],
            Radius(100.0),
        ));

        assert_eq!(registry.len(), 1);
        assert!(registry.get(&PlaceId("home".to_string())).is_none());
        assert_eq!(
            registry
                .get(&PlaceId("work".to_string()))
                .map(|place| place.name.as_str()),
            Some("Office")
        );
    }
}
