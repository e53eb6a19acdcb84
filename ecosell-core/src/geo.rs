//! Great-circle distances and nearest-first ranking of recycling centers.

use crate::model::{Center, CenterCandidate, Coordinates};

/// Mean Earth radius used for haversine distances.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Default number of centers shown after ranking.
pub const DEFAULT_CENTER_LIMIT: usize = 8;

/// Haversine distance between two points in meters.
#[must_use]
pub fn haversine_distance(from: Coordinates, to: Coordinates) -> f64 {
    let lat_from = from.latitude.to_radians();
    let lat_to = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lon = (to.longitude - from.longitude).to_radians();

    let half_chord = (delta_lat / 2.0).sin().powi(2)
        + lat_from.cos() * lat_to.cos() * (delta_lon / 2.0).sin().powi(2);
    let angle = 2.0 * half_chord.sqrt().atan2((1.0 - half_chord).sqrt());

    EARTH_RADIUS_METERS * angle
}

/// Attach distances from `origin`, order nearest first, and keep at most `limit`.
///
/// Equal distances keep the order in which the map service returned them.
#[must_use]
pub fn rank_centers(
    origin: Coordinates,
    candidates: Vec<CenterCandidate>,
    limit: usize,
) -> Vec<Center> {
    let mut centers: Vec<Center> = candidates
        .into_iter()
        .map(|candidate| Center {
            distance_meters: haversine_distance(origin, candidate.location),
            id: candidate.id,
            name: candidate.name,
            latitude: candidate.location.latitude,
            longitude: candidate.location.longitude,
            phone: candidate.phone,
        })
        .collect();

    // `sort_by` is stable.
    centers.sort_by(|left, right| left.distance_meters.total_cmp(&right.distance_meters));
    centers.truncate(limit);
    centers
}

/// Turn-by-turn directions link for a center.
#[must_use]
pub fn directions_url(center: &Center) -> String {
    format!(
        "https://www.google.com/maps/dir/?api=1&destination={},{}",
        center.latitude, center.longitude
    )
}

/// Render a distance as kilometers with one decimal, e.g. `1.2 km`.
#[must_use]
pub fn format_distance_km(distance_meters: f64) -> String {
    format!("{:.1} km", distance_meters / 1_000.0)
}
