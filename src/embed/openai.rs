use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use ureq::Agent;

use super::{Embedder, Embedding};
use crate::error::{Error, Result};
use crate::http::HttpClient;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "text-embedding-ada-002";
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

const EMBEDDINGS_PATH: &str = "/embeddings";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_RESPONSE_BYTES: u64 = 256 * 1024 * 1024;

/// Embedder for the OpenAI embeddings API or any provider that speaks the
/// same `POST /embeddings` wire format.
pub struct OpenAiEmbedder {
    http: HttpClient,
    endpoint: String,
    model: String,
    auth_header: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    data: Vec<EmbeddingData>,
    #[serde(default)]
    model: String,
    #[serde(default)]
    usage: Usage,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    embedding: Vec<f32>,
}

#[derive(Deserialize, Default)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    total_tokens: u64,
}

impl OpenAiEmbedder {
    pub fn new(api_key: &str) -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT, api_key)
    }

    /// Point the embedder at another OpenAI-compatible base URL.
    /// An empty endpoint falls back to the OpenAI default.
    pub fn with_endpoint(endpoint: &str, api_key: &str) -> Self {
        let endpoint = if endpoint.is_empty() {
            DEFAULT_ENDPOINT
        } else {
            endpoint
        };
        Self {
            http: HttpClient::new(Some(REQUEST_TIMEOUT), Some(MAX_RESPONSE_BYTES)),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: DEFAULT_MODEL.to_string(),
            auth_header: format!("Bearer {api_key}"),
        }
    }

    /// Build an embedder for the default endpoint with the key from `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        Self::from_env_var(API_KEY_ENV)
    }

    /// Build an embedder for the default endpoint with the key from `var`.
    /// A missing or empty variable is a configuration error.
    pub fn from_env_var(var: &str) -> Result<Self> {
        match std::env::var(var) {
            Ok(key) if !key.is_empty() => Ok(Self::new(&key)),
            _ => Err(Error::InvalidArgument(format!(
                "embeddings API key not found: set {var}"
            ))),
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Use a caller-configured agent (proxies, TLS, timeouts).
    pub fn with_agent(mut self, agent: Agent) -> Self {
        self.http = HttpClient::with_agent(agent, Some(MAX_RESPONSE_BYTES));
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Embedder for OpenAiEmbedder {
    fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}{EMBEDDINGS_PATH}", self.endpoint);
        let body = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .http
            .agent()
            .post(&url)
            .header("Authorization", &self.auth_header)
            .send_json(&body)?;
        let raw = self.http.read("POST", &url, response)?;

        if !raw.is_success() {
            return Err(Error::Embedding(format!(
                "provider returned HTTP {}: {}",
                raw.status, raw.body
            )));
        }

        let resp: EmbeddingResponse = serde_json::from_str(&raw.body).map_err(|e| {
            Error::decode(
                "embeddings response",
                format!("{e}; response body: {}", raw.body),
            )
        })?;

        debug!(
            endpoint = %self.endpoint,
            model = %resp.model,
            prompt_tokens = resp.usage.prompt_tokens,
            total_tokens = resp.usage.total_tokens,
            "embedding token usage"
        );

        if resp.data.is_empty() {
            return Err(Error::Embedding("provider returned no embeddings".into()));
        }

        Ok(resp.data.into_iter().map(|d| d.embedding).collect())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
