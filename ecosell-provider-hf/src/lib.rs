//! Provider that classifies images through Hugging Face style inference endpoints.
//!
//! Each [`Backend`] maps to its own endpoint: dedicated accelerated and portable
//! endpoints are optional, the default backend uses the shared serverless API.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use ecosell_core::{
    model::LabelScore,
    ports::{Backend, ImageModel, ModelLoader, PortError},
    upload::ImageData,
};

/// Serverless inference API base; the model id is appended.
pub const DEFAULT_INFERENCE_URL: &str = "https://router.huggingface.co/hf-inference/models";

/// Image-classification model used when none is configured.
pub const DEFAULT_MODEL: &str = "google/vit-base-patch16-224";

/// Upper bound for error bodies quoted in messages.
const MAX_ERROR_BODY: usize = 200;

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Serialize)]
struct InferenceParameters {
    top_k: usize,
}

/// One entry of the classification response.
#[derive(Debug, Deserialize)]
struct Prediction {
    label: String,
    #[serde(default)]
    score: f64,
}

#[derive(Debug, Clone, Default)]
/// Endpoints to use per backend.
pub struct BackendEndpoints {
    /// Full URL of a GPU-backed dedicated endpoint.
    pub accelerated: Option<String>,
    /// Full URL of a CPU-backed dedicated endpoint.
    pub portable: Option<String>,
    /// Base URL of the serverless API used by [`Backend::Default`].
    pub default_base: Option<String>,
}

/// Brings up [`HfImageModel`] handles for each backend.
pub struct HfModelLoader {
    client: Client,
    model: String,
    endpoints: BackendEndpoints,
    token: Option<String>,
}

impl HfModelLoader {
    /// Create a loader for `model` with the given endpoints and optional API token.
    #[must_use]
    pub fn new<M: Into<String>>(
        client: Client,
        model: M,
        endpoints: BackendEndpoints,
        token: Option<String>,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            endpoints,
            token,
        }
    }

    /// Endpoint URL for `backend`, `None` when the backend is not configured.
    #[must_use]
    pub fn endpoint(&self, backend: Backend) -> Option<String> {
        match backend {
            Backend::Accelerated => self.endpoints.accelerated.clone(),
            Backend::Portable => self.endpoints.portable.clone(),
            Backend::Default => {
                let base = self
                    .endpoints
                    .default_base
                    .as_deref()
                    .unwrap_or(DEFAULT_INFERENCE_URL);
                Some(format!("{}/{}", base.trim_end_matches('/'), self.model))
            }
        }
    }

    /// Check that the endpoint answers before handing out a model for it.
    ///
    /// Inference routes often only accept POST, so a client error such as 405
    /// still counts as reachable. Transport failures, server errors and
    /// rejected credentials do not.
    async fn check_ready(&self, backend: Backend, url: &str) -> Result<(), PortError> {
        let mut req = self.client.get(url);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let status = req
            .send()
            .await
            .map_err(|err| PortError::BackendUnavailable {
                backend,
                reason: err.to_string(),
            })?
            .status();

        let rejected = matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN);
        if status.is_server_error() || rejected {
            return Err(PortError::BackendUnavailable {
                backend,
                reason: format!("endpoint answered {status}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ModelLoader for HfModelLoader {
    async fn load(&self, backend: Backend) -> Result<Arc<dyn ImageModel>, PortError> {
        let url = self
            .endpoint(backend)
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| PortError::BackendUnavailable {
                backend,
                reason: String::from("no endpoint configured"),
            })?;

        self.check_ready(backend, &url).await?;
        tracing::debug!(%backend, %url, model = %self.model, "inference endpoint reachable");

        Ok(Arc::new(HfImageModel {
            client: self.client.clone(),
            url,
            token: self.token.clone(),
            backend,
        }))
    }
}

/// An image-classification model served over HTTP.
pub struct HfImageModel {
    client: Client,
    url: String,
    token: Option<String>,
    backend: Backend,
}

#[async_trait]
impl ImageModel for HfImageModel {
    fn backend(&self) -> Backend {
        self.backend
    }

    async fn classify(
        &self,
        image: &ImageData,
        top_k: usize,
    ) -> Result<Vec<LabelScore>, PortError> {
        let payload = image.base64();
        let request = InferenceRequest {
            inputs: &payload,
            parameters: InferenceParameters { top_k },
        };

        let mut req = self.client.post(&self.url).json(&request);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let response = req.send().await.map_err(PortError::from)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let excerpt: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(PortError::Inference(format!(
                "{} returned status {status}: {excerpt}",
                self.backend
            )));
        }

        let predictions: Vec<Prediction> = response
            .json()
            .await
            .map_err(|err| PortError::MalformedResponse(err.to_string()))?;

        Ok(predictions
            .into_iter()
            .take(top_k)
            .map(|prediction| LabelScore::new(prediction.label, prediction.score))
            .collect())
    }
}
