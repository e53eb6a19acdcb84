//! Traits describing provider capabilities and shared helper types.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Error as ReqwestError;

use crate::model::{CenterCandidate, Coordinates, LabelScore};
use crate::upload::ImageData;

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while talking to provider backends.
pub enum PortError {
    /// Network layer failed.
    #[error("Network error: {0}")]
    Network(#[from] ReqwestError),
    /// The provider answered with something we could not understand.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    /// The requested inference backend could not be brought up.
    #[error("Backend {backend} unavailable: {reason}")]
    BackendUnavailable {
        /// Backend that failed to load.
        backend: Backend,
        /// Provider-supplied reason.
        reason: String,
    },
    /// The inference call itself failed.
    #[error("Inference failed: {0}")]
    Inference(String),
    /// The device position could not be determined.
    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),
    /// Internal provider error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Compute backends an image model can be loaded on, in preference order.
pub enum Backend {
    /// Hardware-accelerated backend.
    Accelerated,
    /// Portable software backend.
    Portable,
    /// Whatever the provider picks when nothing is requested.
    Default,
}

impl Backend {
    /// Order in which backends are tried on first use.
    pub const FALLBACK_CHAIN: [Self; 3] = [Self::Accelerated, Self::Portable, Self::Default];
}

impl fmt::Display for Backend {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Backend::Accelerated => "accelerated",
            Backend::Portable => "portable",
            Backend::Default => "default",
        };
        formatter.write_str(name)
    }
}

#[async_trait]
/// A loaded image-classification model.
pub trait ImageModel: Send + Sync {
    /// Backend the model was loaded on.
    fn backend(&self) -> Backend;

    /// Return up to `top_k` candidate labels, best first.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when inference fails.
    async fn classify(&self, image: &ImageData, top_k: usize)
    -> Result<Vec<LabelScore>, PortError>;
}

#[async_trait]
/// Factory that brings up an [`ImageModel`] on a specific backend.
pub trait ModelLoader: Send + Sync {
    /// Load the model on `backend`.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::BackendUnavailable`] (or a transport error) when the
    /// backend cannot be used.
    async fn load(&self, backend: Backend) -> Result<Arc<dyn ImageModel>, PortError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Parameters of a radius-bounded recycling center search.
pub struct CenterQuery {
    /// Center of the search.
    pub origin: Coordinates,
    /// Search radius in meters.
    pub radius_meters: u32,
    /// Maximum number of raw results requested from the map service.
    pub max_results: usize,
    /// Server-side timeout requested from the map service.
    pub timeout_seconds: u32,
}

impl CenterQuery {
    /// Default search radius.
    pub const DEFAULT_RADIUS_METERS: u32 = 5_000;
    /// Default number of raw results.
    pub const DEFAULT_MAX_RESULTS: usize = 20;
    /// Default server-side timeout.
    pub const DEFAULT_TIMEOUT_SECONDS: u32 = 25;

    /// Query around `origin` with the default radius, result cap, and timeout.
    #[must_use]
    pub fn around(origin: Coordinates) -> Self {
        Self {
            origin,
            radius_meters: Self::DEFAULT_RADIUS_METERS,
            max_results: Self::DEFAULT_MAX_RESULTS,
            timeout_seconds: Self::DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

#[async_trait]
/// Trait for map-data backends that find recycling centers.
pub trait CenterPort: Send + Sync {
    /// Find recycling-related points of interest for the query.
    ///
    /// Candidates without usable coordinates are already dropped; order is the
    /// service's own response order.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the request fails or the response is malformed.
    async fn nearby(&self, query: &CenterQuery) -> Result<Vec<CenterCandidate>, PortError>;
}

#[async_trait]
/// One-shot device position lookup.
pub trait LocationPort: Send + Sync {
    /// Determine the current position.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::LocationUnavailable`] when no position can be obtained.
    async fn locate(&self) -> Result<Coordinates, PortError>;
}

/// Location source that always reports a configured position.
pub struct FixedLocation {
    coordinates: Coordinates,
}

impl FixedLocation {
    /// Report `coordinates` on every lookup.
    #[must_use]
    pub fn new(coordinates: Coordinates) -> Self {
        Self { coordinates }
    }
}

#[async_trait]
impl LocationPort for FixedLocation {
    async fn locate(&self) -> Result<Coordinates, PortError> {
        Ok(self.coordinates)
    }
}
