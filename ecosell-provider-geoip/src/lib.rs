//! Provider that estimates the user's position from their public IP address.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use ecosell_core::{
    model::Coordinates,
    ports::{LocationPort, PortError},
};

/// Free IP geolocation endpoint returning `latitude`/`longitude` JSON.
pub const DEFAULT_GEOIP_URL: &str = "https://ipapi.co/json/";

/// Response of an ipapi-style lookup.
#[derive(Debug, Deserialize)]
struct GeoIpResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
    #[serde(default)]
    error: bool,
    reason: Option<String>,
    city: Option<String>,
}

/// One-shot location lookup based on the caller's IP address.
pub struct GeoIpLocator {
    client: Client,
    url: String,
}

impl GeoIpLocator {
    /// Create a locator using the default service.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self::with_url(client, DEFAULT_GEOIP_URL)
    }

    /// Create a locator using a specific lookup URL.
    #[must_use]
    pub fn with_url<U: Into<String>>(client: Client, url: U) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl LocationPort for GeoIpLocator {
    async fn locate(&self) -> Result<Coordinates, PortError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| PortError::LocationUnavailable(err.to_string()))?
            .json::<GeoIpResponse>()
            .await
            .map_err(|err| PortError::LocationUnavailable(err.to_string()))?;

        if response.error {
            let reason = response
                .reason
                .unwrap_or_else(|| String::from("lookup refused"));
            return Err(PortError::LocationUnavailable(reason));
        }

        let coordinates = response
            .latitude
            .zip(response.longitude)
            .and_then(|(latitude, longitude)| Coordinates::new(latitude, longitude))
            .ok_or_else(|| {
                PortError::LocationUnavailable(String::from("no coordinates in lookup"))
            })?;

        tracing::info!(
            %coordinates,
            city = response.city.as_deref().unwrap_or("?"),
            "position estimated from IP"
        );

        Ok(coordinates)
    }
}
