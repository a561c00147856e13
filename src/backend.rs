use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const MODELS_TIMEOUT: Duration = Duration::from_secs(20);
const SEARCH_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("service returned {status}")]
    Http {
        status: StatusCode,
        detail: Option<String>,
    },
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("malformed response: {0}")]
    Decode(serde_json::Error),
}

impl BackendError {
    /// Human-readable message for the status banner: server detail first,
    /// then a status-derived line, then a generic one.
    pub fn message(&self) -> String {
        match self {
            BackendError::Http { status, detail } => detail
                .clone()
                .unwrap_or_else(|| format!("The map service returned {status}.")),
            BackendError::Network(_) => "Could not reach the map service.".to_string(),
            BackendError::Decode(_) => "The map service sent an unreadable reply.".to_string(),
        }
    }
}

/// One selectable backing model, as served by the registry endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModelOption {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Deserialize)]
struct ModelsEnvelope {
    #[serde(default)]
    data: Vec<ModelOption>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MapCenter {
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub label: Option<String>,
}

impl MapCenter {
    /// Both coordinates present and finite, or the center counts as absent.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Place {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub address: Option<String>,
}

impl Place {
    /// A place is renderable iff both coordinates are present and finite.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
            _ => None,
        }
    }
}

/// Agent answer. Every field is optional; absent fields skip the
/// corresponding update rather than failing the whole reply.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AgentReply {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub center: Option<MapCenter>,
    #[serde(default)]
    pub places: Option<Vec<Place>>,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    prompt: &'a str,
    model_name: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
}

#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn list_models(&self) -> Result<Vec<ModelOption>, BackendError> {
        let url = format!("{}/models/openrouter", self.base_url);
        log::debug!("GET {url}");

        let response = self
            .client
            .get(&url)
            .timeout(MODELS_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        // Order as received; the service already filters and sorts.
        let envelope: ModelsEnvelope = Self::decode(response).await?;
        Ok(envelope.data)
    }

    pub async fn search(&self, prompt: &str, model_name: &str) -> Result<AgentReply, BackendError> {
        let url = format!("{}/agent/map", self.base_url);
        log::debug!("POST {url} model={model_name}");

        let request = SearchRequest { prompt, model_name };
        let response = self
            .client
            .post(&url)
            .timeout(SEARCH_TIMEOUT)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        Self::decode(response).await
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, BackendError> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(BackendError::Decode)
    }

    async fn error_from(response: reqwest::Response) -> BackendError {
        let status = response.status();
        let detail = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.detail);
        BackendError::Http { status, detail }
    }
}
