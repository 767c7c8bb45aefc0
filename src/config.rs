use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::client::{
    ChromaClient, ClientOptions, DEFAULT_API_PATH, DEFAULT_EMBED_BATCH_SIZE,
    DEFAULT_MAX_RESPONSE_BYTES,
};
use crate::embed::openai::{self, OpenAiEmbedder};

/// Environment variable that overrides `chroma.url`.
pub const CHROMA_URL_ENV: &str = "CHROMA_URL";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub chroma: ChromaConfig,
    pub embed: EmbedConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChromaConfig {
    /// Server URL, without the API path
    pub url: String,
    pub api_path: String,
    /// Request timeout in seconds (0 = no timeout)
    pub timeout_secs: u64,
    /// Documents per embeddings call when adding
    pub embed_batch_size: usize,
    /// Largest response body to read, in bytes (0 = no limit)
    pub max_response_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedConfig {
    /// OpenAI-compatible base URL
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
}

impl Default for ChromaConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000".to_string(),
            api_path: DEFAULT_API_PATH.to_string(),
            timeout_secs: 30,
            embed_batch_size: DEFAULT_EMBED_BATCH_SIZE,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            endpoint: openai::DEFAULT_ENDPOINT.to_string(),
            model: openai::DEFAULT_MODEL.to_string(),
            api_key_env: openai::API_KEY_ENV.to_string(),
        }
    }
}

impl Config {
    /// Load config from a TOML file, falling back to defaults when it is
    /// missing, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        if let Ok(url) = std::env::var(CHROMA_URL_ENV) {
            if !url.is_empty() {
                config.chroma.url = url;
            }
        }
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("parsing config from {}", path.display()))
    }

    /// Write current config to disk (for `chroma init`).
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating config dir {}", dir.display()))?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("writing config to {}", path.display()))?;
        Ok(())
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            api_path: self.chroma.api_path.clone(),
            timeout: match self.chroma.timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            embed_batch_size: self.chroma.embed_batch_size,
            max_response_bytes: match self.chroma.max_response_bytes {
                0 => None,
                bytes => Some(bytes),
            },
        }
    }

    pub fn client(&self) -> Result<ChromaClient> {
        ChromaClient::with_options(&self.chroma.url, self.client_options())
            .with_context(|| format!("connecting to {}", self.chroma.url))
    }

    /// The embeddings API key, read from the configured environment variable.
    pub fn api_key(&self) -> Result<String> {
        match std::env::var(&self.embed.api_key_env) {
            Ok(key) if !key.is_empty() => Ok(key),
            _ => bail!(
                "embeddings API key not found: set {}",
                self.embed.api_key_env
            ),
        }
    }

    pub fn embedder(&self) -> Result<OpenAiEmbedder> {
        let key = self.api_key()?;
        Ok(OpenAiEmbedder::with_endpoint(&self.embed.endpoint, &key).with_model(&self.embed.model))
    }
}
