/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use super::types::*;
use std::f64::consts::PI;

pub const DEFAULT_DISPLAY_NAME: &str = "Family Member";

fn deg2rad(degrees: f64) -> f64 {
    degrees * PI / 180.0
}

pub fn distance_between_in_meters(latlong1: &Point, latlong2: &Point) -> f64 {
    // Calculating using haversine formula
    // Radius of Earth in meters
    let r: f64 = 6371000.0;

    let Latitude(lat1) = latlong1.lat;
    let Longitude(lon1) = latlong1.lon;
    let Latitude(lat2) = latlong2.lat;
    let Longitude(lon2) = latlong2.lon;

    let dlat = deg2rad(lat2 - lat1);
    let dlon = deg2rad(lon2 - lon1);

    let rlat1 = deg2rad(lat1);
    let rlat2 = deg2rad(lat2);

    let sq = |x: f64| x * x;

    // h stays within [0, 1] for valid coordinates, which keeps the result real
    let h = sq((dlat / 2.0).sin()) + rlat1.cos() * rlat2.cos() * sq((dlon / 2.0).sin());

    2.0 * r * h.sqrt().atan2((1.0 - h).sqrt())
}

pub fn is_valid_coordinate(lat: f64, lon: f64) -> bool {
    lat.is_finite() && lon.is_finite() && (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
}

/// Signed number of seconds elapsed from `earlier` to `later`, with millisecond precision.
pub fn seconds_between(TimeStamp(later): TimeStamp, TimeStamp(earlier): TimeStamp) -> f64 {
    (later - earlier).num_milliseconds() as f64 / 1000.0
}

/// "jane.doe@example.com" becomes "Jane.doe". Missing or empty emails fall back to a generic name.
pub fn display_name_from_email(email: Option<&str>) -> String {
    let local_part = email
        .map(|email| email.split('@').next().unwrap_or_default().trim())
        .unwrap_or_default();

    let mut chars = local_part.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => DEFAULT_DISPLAY_NAME.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lon: f64) -> Point {
        Point {
            lat: Latitude(lat),
            lon: Longitude(lon),
        }
    }

    #[test]
    fn distance_to_self_is_zero() {
        let home = point(-26.2041, 28.0473);
        assert!(distance_between_in_meters(&home, &home).abs() < 1e-6);
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let distance = distance_between_in_meters(&point(0.0, 0.0), &point(1.0, 0.0));
        assert!((distance - 111_195.0).abs() < 100.0);
    }

    #[test]
    fn display_name_uses_capitalised_local_part() {
        assert_eq!(display_name_from_email(Some("jane.doe@example.com")), "Jane.doe");
        assert_eq!(display_name_from_email(Some("@example.com")), DEFAULT_DISPLAY_NAME);
        assert_eq!(display_name_from_email(None), DEFAULT_DISPLAY_NAME);
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(is_valid_coordinate(-26.2, 28.0));
        assert!(!is_valid_coordinate(91.0, 0.0));
        assert!(!is_valid_coordinate(0.0, f64::NAN));
    }
}
