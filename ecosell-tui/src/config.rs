//! Command line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use ecosell_core::{Coordinates, SearchSettings};
use ecosell_provider_geoip::DEFAULT_GEOIP_URL;
use ecosell_provider_hf::{BackendEndpoints, DEFAULT_INFERENCE_URL, DEFAULT_MODEL};
use ecosell_provider_overpass::DEFAULT_INTERPRETER_URL;

#[derive(thiserror::Error, Debug, PartialEq)]
pub(crate) enum ConfigError {
    #[error("--lat and --lon must be given together")]
    PartialLocation,
    #[error("invalid coordinates {latitude}, {longitude}")]
    InvalidLocation { latitude: f64, longitude: f64 },
    #[error("{name} must be greater than zero")]
    NotPositive { name: &'static str },
    #[error("--weight must be a non-negative number of kilograms, got {weight}")]
    InvalidWeight { weight: f64 },
}

#[derive(Debug, Parser)]
#[command(name = "ecosell", version)]
#[command(about = "Identify recyclables from photos, see indicative prices, and find nearby centers")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Fixed latitude instead of IP geolocation.
    #[arg(long, env = "ECOSELL_LAT", allow_negative_numbers = true, global = true)]
    pub lat: Option<f64>,

    /// Fixed longitude instead of IP geolocation.
    #[arg(long, env = "ECOSELL_LON", allow_negative_numbers = true, global = true)]
    pub lon: Option<f64>,

    /// IP geolocation lookup URL.
    #[arg(long, env = "ECOSELL_GEOIP_URL", default_value = DEFAULT_GEOIP_URL, global = true)]
    pub geoip_url: String,

    /// Overpass interpreter endpoint.
    #[arg(long, env = "ECOSELL_OVERPASS_URL", default_value = DEFAULT_INTERPRETER_URL, global = true)]
    pub overpass_url: String,

    /// Image-classification model id.
    #[arg(long, env = "ECOSELL_MODEL", default_value = DEFAULT_MODEL, global = true)]
    pub model: String,

    /// Base URL of the serverless inference API.
    #[arg(long, env = "ECOSELL_INFERENCE_URL", default_value = DEFAULT_INFERENCE_URL, global = true)]
    pub inference_url: String,

    /// Dedicated GPU inference endpoint.
    #[arg(long, env = "ECOSELL_ACCELERATED_ENDPOINT", global = true)]
    pub accelerated_endpoint: Option<String>,

    /// Dedicated CPU inference endpoint.
    #[arg(long, env = "ECOSELL_PORTABLE_ENDPOINT", global = true)]
    pub portable_endpoint: Option<String>,

    /// Inference API token.
    #[arg(long, env = "HF_TOKEN", hide_env_values = true, global = true)]
    pub hf_token: Option<String>,

    /// Search radius around the user in meters.
    #[arg(long, env = "ECOSELL_RADIUS_METERS", default_value_t = SearchSettings::default().radius_meters, global = true)]
    pub radius: u32,

    /// Number of centers to show.
    #[arg(long, env = "ECOSELL_CENTER_LIMIT", default_value_t = SearchSettings::default().limit, global = true)]
    pub limit: usize,

    /// HTTP request timeout in seconds.
    #[arg(long, env = "ECOSELL_HTTP_TIMEOUT_SECS", default_value_t = 30, global = true)]
    pub timeout: u64,

    /// Where log output is written.
    #[arg(long, env = "ECOSELL_LOG_FILE", default_value = "ecosell.log", global = true)]
    pub log_file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub(crate) enum Command {
    /// Classify one image and print its price estimate.
    Classify {
        /// Image file (JPG, PNG, WEBP or GIF).
        path: PathBuf,
        /// Weight in kilograms for the estimate.
        #[arg(long, default_value_t = 1.0)]
        weight: f64,
    },
    /// List recycling centers near the current position.
    Centers,
    /// Print the price list.
    Prices,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LocationSource {
    Fixed(Coordinates),
    GeoIp(String),
}

#[derive(Debug, Clone)]
pub(crate) struct AppConfig {
    pub location: LocationSource,
    pub overpass_url: String,
    pub model: String,
    pub endpoints: BackendEndpoints,
    pub hf_token: Option<String>,
    pub search: SearchSettings,
    pub http_timeout: Duration,
    pub log_file: PathBuf,
}

impl Cli {
    /// Validate the parsed arguments and split off the subcommand.
    pub(crate) fn into_config(self) -> Result<(AppConfig, Option<Command>), ConfigError> {
        let location = match (self.lat, self.lon) {
            (Some(latitude), Some(longitude)) => LocationSource::Fixed(
                Coordinates::new(latitude, longitude)
                    .ok_or(ConfigError::InvalidLocation { latitude, longitude })?,
            ),
            (None, None) => LocationSource::GeoIp(self.geoip_url),
            _ => return Err(ConfigError::PartialLocation),
        };

        if self.radius == 0 {
            return Err(ConfigError::NotPositive { name: "--radius" });
        }
        if self.limit == 0 {
            return Err(ConfigError::NotPositive { name: "--limit" });
        }
        if self.timeout == 0 {
            return Err(ConfigError::NotPositive { name: "--timeout" });
        }
        if let Some(Command::Classify { weight, .. }) = &self.command
            && (!weight.is_finite() || *weight < 0.0)
        {
            return Err(ConfigError::InvalidWeight { weight: *weight });
        }

        let search = SearchSettings {
            radius_meters: self.radius,
            limit: self.limit,
            ..SearchSettings::default()
        };

        let config = AppConfig {
            location,
            overpass_url: self.overpass_url,
            model: self.model,
            endpoints: BackendEndpoints {
                accelerated: self.accelerated_endpoint,
                portable: self.portable_endpoint,
                default_base: Some(self.inference_url),
            },
            hf_token: self.hf_token.filter(|token| !token.trim().is_empty()),
            search,
            http_timeout: Duration::from_secs(self.timeout),
            log_file: self.log_file,
        };

        Ok((config, self.command))
    }
}
