use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::info;
use url::Url;

use crate::collection::wire::{CollectionInfo, CreateCollectionRequest};
use crate::collection::{Collection, DISTANCE_METADATA_KEY, DistanceFunction, Metadata};
use crate::error::{Error, Result};
use crate::http::{self, HttpClient};

pub const DEFAULT_API_PATH: &str = "/api/v1";
pub const DEFAULT_EMBED_BATCH_SIZE: usize = 10;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_RESPONSE_BYTES: u64 = 512 * 1024 * 1024;

/// Connection options for [`ChromaClient::with_options`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Path prefix of the REST API under the server URL.
    pub api_path: String,
    /// Whole-request timeout; `None` waits forever.
    pub timeout: Option<Duration>,
    /// Texts per embeddings call when adding documents.
    pub embed_batch_size: usize,
    /// Largest response body read from the server; `None` reads any size.
    pub max_response_bytes: Option<u64>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_path: DEFAULT_API_PATH.to_string(),
            timeout: Some(DEFAULT_TIMEOUT),
            embed_batch_size: DEFAULT_EMBED_BATCH_SIZE,
            max_response_bytes: Some(DEFAULT_MAX_RESPONSE_BYTES),
        }
    }
}

/// Client bound to one ChromaDB server.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Clone)]
pub struct ChromaClient {
    http: HttpClient,
    api_root: Url,
    base_url: String,
    embed_batch_size: usize,
}

impl fmt::Debug for ChromaClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChromaClient")
            .field("base_url", &self.base_url)
            .field("embed_batch_size", &self.embed_batch_size)
            .finish()
    }
}

#[derive(Deserialize)]
struct Heartbeat {
    #[serde(rename = "nanosecond heartbeat")]
    nanos: u64,
}

impl ChromaClient {
    pub fn new(server_url: &str) -> Result<Self> {
        Self::with_options(server_url, ClientOptions::default())
    }

    pub fn with_options(server_url: &str, options: ClientOptions) -> Result<Self> {
        let url = Url::parse(server_url)
            .map_err(|e| Error::InvalidUrl(format!("{server_url:?}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl(format!(
                "{server_url:?}: unsupported scheme {:?}",
                url.scheme()
            )));
        }
        if options.embed_batch_size == 0 {
            return Err(Error::InvalidArgument(
                "embed batch size must be positive".into(),
            ));
        }

        let api_path = options.api_path.trim_matches('/');
        let root = url.as_str().trim_end_matches('/');
        let base_url = if api_path.is_empty() {
            root.to_string()
        } else {
            format!("{root}/{api_path}")
        };
        let api_root =
            Url::parse(&base_url).map_err(|e| Error::InvalidUrl(format!("{base_url:?}: {e}")))?;

        Ok(Self {
            http: HttpClient::new(options.timeout, options.max_response_bytes),
            api_root,
            base_url,
            embed_batch_size: options.embed_batch_size,
        })
    }

    /// Root of the REST API, e.g. `http://localhost:8000/api/v1`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// URL of a named collection. The name is one percent-encoded path
    /// segment, so spaces, `/` and `?` stay inside it.
    fn collection_url(&self, name: &str) -> Result<String> {
        let mut url = self.api_root.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(format!("{:?}: cannot be a base", self.base_url)))?
            .pop_if_empty()
            .push("collections")
            .push(name);
        Ok(url.into())
    }

    pub(crate) fn http(&self) -> &HttpClient {
        &self.http
    }

    pub(crate) fn embed_batch_size(&self) -> usize {
        self.embed_batch_size
    }

    /// Server liveness counter in nanoseconds.
    pub fn heartbeat(&self) -> Result<u64> {
        let hb: Heartbeat = self.http.get(&self.url("/heartbeat"))?.json("heartbeat")?;
        Ok(hb.nanos)
    }

    /// Wipe the whole server. The server answers with a bare `true`, or with
    /// an error object when resetting is disabled.
    pub fn reset(&self) -> Result<bool> {
        let raw = self.http.post_empty(&self.url("/reset"))?;
        match http::parse_bool_or_error(&raw.body) {
            Ok(_) | Err(Error::Decode { .. }) if !raw.is_success() => Err(Error::Status {
                status: raw.status,
                body: raw.body,
            }),
            Ok(reset) => {
                info!(base_url = %self.base_url, reset, "server reset");
                Ok(reset)
            }
            Err(e) => Err(e),
        }
    }

    pub fn version(&self) -> Result<String> {
        let body = self.http.get(&self.url("/version"))?.text()?;
        Ok(http::strip_quotes(&body))
    }

    pub fn list_collections(&self) -> Result<Vec<Collection>> {
        let infos: Vec<CollectionInfo> =
            self.http.get(&self.url("/collections"))?.json("collection list")?;
        Ok(infos
            .into_iter()
            .map(|info| Collection::from_info(info, self.clone()))
            .collect())
    }

    pub fn get_collection(&self, name: &str) -> Result<Collection> {
        let url = self.collection_url(name)?;
        let info: CollectionInfo = self.http.get(&url)?.json("collection")?;
        Ok(Collection::from_info(info, self.clone()))
    }

    /// Create a collection; fails if one with this name already exists.
    pub fn create_collection(
        &self,
        name: &str,
        distance: DistanceFunction,
        metadata: Option<Metadata>,
    ) -> Result<Collection> {
        self.create(name, distance, metadata, false)
    }

    /// Create a collection, or return the existing one with this name.
    /// Metadata of an existing collection is whatever the server keeps.
    pub fn get_or_create_collection(
        &self,
        name: &str,
        distance: DistanceFunction,
        metadata: Option<Metadata>,
    ) -> Result<Collection> {
        self.create(name, distance, metadata, true)
    }

    fn create(
        &self,
        name: &str,
        distance: DistanceFunction,
        metadata: Option<Metadata>,
        get_or_create: bool,
    ) -> Result<Collection> {
        let metadata = with_distance(metadata, distance);
        let request = CreateCollectionRequest {
            name,
            metadata: &metadata,
            get_or_create,
        };
        let info: CollectionInfo = self
            .http
            .post_json(&self.url("/collections"), &request)?
            .json("created collection")?;
        info!(collection = %info.name, id = %info.id, get_or_create, "collection ready");
        Ok(Collection::from_info(info, self.clone()))
    }

    pub fn delete_collection(&self, name: &str) -> Result<()> {
        let url = self.collection_url(name)?;
        self.http.delete(&url)?.text()?;
        info!(collection = name, "collection deleted");
        Ok(())
    }
}

/// Fill in the distance function key unless the caller already set one.
fn with_distance(metadata: Option<Metadata>, distance: DistanceFunction) -> Metadata {
    let mut metadata = metadata.unwrap_or_default();
    metadata
        .entry(DISTANCE_METADATA_KEY)
        .or_insert_with(|| Value::String(distance.as_str().to_string()));
    metadata
}
