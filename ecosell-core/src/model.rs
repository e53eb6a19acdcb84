//! Domain data structures for waste categories, classifications, and recycling centers.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Material classes used throughout pricing and classification.
pub enum WasteCategory {
    /// Paper, newspaper, and cardboard.
    Paper,
    /// Plastic bottles and packaging.
    Plastic,
    /// Glass bottles and jars.
    Glass,
    /// Steel, aluminium, and other scrap metal.
    Metal,
    /// Anything that no rule recognises.
    Mixed,
}

impl WasteCategory {
    /// All categories in showcase order.
    pub const ALL: [Self; 5] = [
        Self::Paper,
        Self::Plastic,
        Self::Glass,
        Self::Metal,
        Self::Mixed,
    ];

    /// Stable lowercase identifier.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Paper => "paper",
            Self::Plastic => "plastic",
            Self::Glass => "glass",
            Self::Metal => "metal",
            Self::Mixed => "mixed",
        }
    }
}

impl fmt::Display for WasteCategory {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.slug())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A single candidate label as ranked by the inference service.
pub struct LabelScore {
    /// Free-text label from the model.
    pub label: String,
    /// Confidence reported for the label.
    pub score: f64,
}

impl LabelScore {
    /// Construct a candidate.
    #[must_use]
    pub fn new<L: Into<String>>(label: L, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Outcome of classifying one image.
pub struct ClassificationResult {
    /// Label text of the winning candidate.
    pub label: String,
    /// Confidence of the winning candidate in `[0, 1]`.
    pub score: f64,
    /// Category the label maps to.
    pub category: WasteCategory,
}

impl ClassificationResult {
    /// Result reported when classification could not be performed at all.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            label: String::from("unknown"),
            score: 0.0,
            category: WasteCategory::Mixed,
        }
    }

    /// Confidence as a whole percentage, e.g. `87`.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "value is clamped to 0..=100"
    )]
    pub fn confidence_percent(&self) -> u8 {
        (self.score.clamp(0.0, 1.0) * 100.0).round() as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// A latitude/longitude pair in decimal degrees.
pub struct Coordinates {
    /// Latitude in `[-90, 90]`.
    pub latitude: f64,
    /// Longitude in `[-180, 180]`.
    pub longitude: f64,
}

impl Coordinates {
    /// Build coordinates, rejecting non-finite or out-of-range values.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self {
            latitude,
            longitude,
        })
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{:.5}, {:.5}", self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Identifier of a recycling center as reported by the map service.
pub struct CenterId(pub String);

impl fmt::Display for CenterId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A normalized map-service result before it is ranked by distance.
pub struct CenterCandidate {
    /// Identifier from the map service.
    pub id: CenterId,
    /// Display name.
    pub name: String,
    /// Position of the center.
    pub location: Coordinates,
    /// Optional contact phone number.
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A recycling center ranked against the user's position.
pub struct Center {
    /// Identifier from the map service.
    pub id: CenterId,
    /// Display name.
    pub name: String,
    /// Latitude of the center.
    pub latitude: f64,
    /// Longitude of the center.
    pub longitude: f64,
    /// Optional contact phone number.
    pub phone: Option<String>,
    /// Great-circle distance from the user in meters.
    pub distance_meters: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Result of one nearby-centers lookup.
pub struct NearbyCenters {
    /// Position the lookup was made from.
    pub origin: Coordinates,
    /// Centers ordered nearest first.
    pub centers: Vec<Center>,
    /// When the lookup completed.
    pub fetched_at: DateTime<Utc>,
}
