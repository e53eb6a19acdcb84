//! Provider that finds recycling centers through the Overpass API.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use ecosell_core::{
    model::{CenterCandidate, CenterId, Coordinates},
    ports::{CenterPort, CenterQuery, PortError},
};

/// Public Overpass interpreter endpoint.
pub const DEFAULT_INTERPRETER_URL: &str = "https://overpass-api.de/api/interpreter";

/// Name used when an element carries neither a name nor an operator.
pub const FALLBACK_NAME: &str = "Recycling / Scrap Center";

/// Tag filters selecting recycling amenities, scrap shops, and transfer stations.
const TAG_FILTERS: [&str; 3] = [
    "[amenity=recycling]",
    "[shop=scrap]",
    "[amenity=waste_transfer_station]",
];

/// Response body of the interpreter with `[out:json]`.
#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<Element>,
}

/// Single node/way/relation. Everything is kept loosely typed so that one odd
/// element does not fail the whole response.
#[derive(Debug, Deserialize)]
struct Element {
    id: Option<Value>,
    lat: Option<Value>,
    lon: Option<Value>,
    // present on ways/relations with `out center`
    center: Option<Value>,
    tags: Option<Value>,
}

impl Element {
    fn coordinates(&self) -> Option<Coordinates> {
        let center = |key: &str| {
            self.center
                .as_ref()
                .and_then(|center| center.get(key))
                .and_then(Value::as_f64)
        };
        let latitude = self.lat.as_ref().map_or_else(|| center("lat"), Value::as_f64)?;
        let longitude = self.lon.as_ref().map_or_else(|| center("lon"), Value::as_f64)?;
        Coordinates::new(latitude, longitude)
    }

    fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .as_ref()
            .and_then(|tags| tags.get(key))
            .and_then(Value::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    fn id(&self, position: usize) -> CenterId {
        let id = match &self.id {
            Some(Value::Number(number)) => number.to_string(),
            Some(Value::String(text)) if !text.is_empty() => text.clone(),
            _ => format!("element-{position}"),
        };
        CenterId(id)
    }

    fn into_candidate(self, position: usize) -> Option<CenterCandidate> {
        let location = self.coordinates()?;
        let name = self
            .tag("name")
            .or_else(|| self.tag("operator"))
            .unwrap_or(FALLBACK_NAME)
            .to_owned();
        let phone = self
            .tag("phone")
            .or_else(|| self.tag("contact:phone"))
            .map(str::to_owned);

        Some(CenterCandidate {
            id: self.id(position),
            name,
            location,
            phone,
        })
    }
}

/// Build the Overpass QL query for a center search.
#[must_use]
pub fn build_query(query: &CenterQuery) -> String {
    let CenterQuery {
        origin,
        radius_meters,
        max_results,
        timeout_seconds,
    } = query;

    let selectors: String = TAG_FILTERS
        .iter()
        .map(|filter| {
            format!(
                "  node(around:{radius_meters},{},{}){filter};\n",
                origin.latitude, origin.longitude
            )
        })
        .collect();

    format!("[out:json][timeout:{timeout_seconds}];\n(\n{selectors});\nout center {max_results};\n")
}

/// Recycling center search backed by an Overpass interpreter.
pub struct OverpassCenters {
    client: Client,
    interpreter_url: String,
}

impl OverpassCenters {
    /// Create a port talking to the public interpreter.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self::with_interpreter_url(client, DEFAULT_INTERPRETER_URL)
    }

    /// Create a port talking to a specific interpreter endpoint.
    #[must_use]
    pub fn with_interpreter_url<U: Into<String>>(client: Client, interpreter_url: U) -> Self {
        Self {
            client,
            interpreter_url: interpreter_url.into(),
        }
    }
}

#[async_trait]
impl CenterPort for OverpassCenters {
    async fn nearby(&self, query: &CenterQuery) -> Result<Vec<CenterCandidate>, PortError> {
        let body = build_query(query);
        tracing::debug!(url = %self.interpreter_url, query = %body, "querying overpass");

        let req = self
            .client
            .post(&self.interpreter_url)
            .header(CONTENT_TYPE, "text/plain")
            .body(body);

        let response = fetch_json::<OverpassResponse>(req).await?;
        let total = response.elements.len();

        let candidates: Vec<CenterCandidate> = response
            .elements
            .into_iter()
            .enumerate()
            .filter_map(|(position, element)| element.into_candidate(position))
            .collect();

        tracing::debug!(
            total,
            usable = candidates.len(),
            "overpass elements normalized"
        );

        Ok(candidates)
    }
}

// Small helper to fetch and decode JSON with status handling.
async fn fetch_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, PortError> {
    let text = req
        .send()
        .await
        .map_err(PortError::from)?
        .error_for_status()
        .map_err(PortError::from)?
        .text()
        .await
        .map_err(PortError::from)?;

    serde_json::from_str(&text).map_err(|err| PortError::MalformedResponse(err.to_string()))
}
