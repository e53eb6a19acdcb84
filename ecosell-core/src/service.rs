//! High-level service facade combining the classifier and all providers.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;

use crate::classifier::WasteClassifier;
use crate::geo::{DEFAULT_CENTER_LIMIT, rank_centers};
use crate::model::{ClassificationResult, Coordinates, NearbyCenters};
use crate::ports::{CenterPort, CenterQuery, LocationPort, ModelLoader, PortError};
use crate::upload::{ImageData, ImageFile, UploadError, read_image};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Tuning for nearby-center lookups.
pub struct SearchSettings {
    /// Search radius in meters.
    pub radius_meters: u32,
    /// Raw results requested from the map service.
    pub max_results: usize,
    /// Server-side timeout requested from the map service.
    pub timeout_seconds: u32,
    /// Centers kept after ranking.
    pub limit: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            radius_meters: CenterQuery::DEFAULT_RADIUS_METERS,
            max_results: CenterQuery::DEFAULT_MAX_RESULTS,
            timeout_seconds: CenterQuery::DEFAULT_TIMEOUT_SECONDS,
            limit: DEFAULT_CENTER_LIMIT,
        }
    }
}

impl SearchSettings {
    /// Map query for `origin` using these settings.
    #[must_use]
    pub fn query(&self, origin: Coordinates) -> CenterQuery {
        CenterQuery {
            origin,
            radius_meters: self.radius_meters,
            max_results: self.max_results,
            timeout_seconds: self.timeout_seconds,
        }
    }
}

/// Public entry point for classifying images and finding recycling centers.
pub struct EcoSellService {
    classifier: WasteClassifier,
    centers: Arc<dyn CenterPort>,
    location: Arc<dyn LocationPort>,
    settings: SearchSettings,
}

impl EcoSellService {
    /// Create a new service from its providers.
    #[must_use]
    pub fn new(
        models: Arc<dyn ModelLoader>,
        centers: Arc<dyn CenterPort>,
        location: Arc<dyn LocationPort>,
        settings: SearchSettings,
    ) -> Self {
        Self {
            classifier: WasteClassifier::new(models),
            centers,
            location,
            settings,
        }
    }

    /// Classifier used by the service.
    #[must_use]
    pub fn classifier(&self) -> &WasteClassifier {
        &self.classifier
    }

    /// Lookup settings in effect.
    #[must_use]
    pub fn settings(&self) -> SearchSettings {
        self.settings
    }

    /// Classify an image that is already in memory.
    pub async fn classify(&self, image: &ImageData) -> ClassificationResult {
        self.classifier.classify(image).await
    }

    /// Validate, read, and classify a file on disk.
    ///
    /// # Errors
    ///
    /// Returns an [`UploadError`] if the file type is not accepted or the file
    /// cannot be read. Classification itself never fails.
    pub async fn classify_file(
        &self,
        path: &Path,
    ) -> Result<(ImageData, ClassificationResult), UploadError> {
        let image = read_image(&ImageFile::from_path(path)).await?;
        let result = self.classify(&image).await;
        Ok((image, result))
    }

    /// Determine the user's position.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the location provider cannot produce a fix.
    pub async fn locate(&self) -> Result<Coordinates, PortError> {
        self.location.locate().await
    }

    /// Find recycling centers around `origin`, nearest first.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] if the map service request fails or its response
    /// cannot be parsed.
    pub async fn nearby_centers(&self, origin: Coordinates) -> Result<NearbyCenters, PortError> {
        let query = self.settings.query(origin);
        let candidates = self.centers.nearby(&query).await?;
        let found = candidates.len();
        let centers = rank_centers(origin, candidates, self.settings.limit);

        tracing::info!(%origin, found, kept = centers.len(), "nearby centers ranked");

        Ok(NearbyCenters {
            origin,
            centers,
            fetched_at: Utc::now(),
        })
    }
}
