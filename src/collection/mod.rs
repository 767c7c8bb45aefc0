pub(crate) mod wire;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::batch::slice_batch;
use crate::client::ChromaClient;
use crate::embed::{Embedder, Embedding};
use crate::error::{Error, Result};
use wire::{AddRequest, CollectionInfo, GetRequest, GetResponse, QueryRequest, QueryResponse};

/// Collection and document metadata: string keys, scalar or JSON values.
pub type Metadata = serde_json::Map<String, Value>;

/// Metadata key the server reads the distance function from.
pub const DISTANCE_METADATA_KEY: &str = "hnsw:space";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Embedding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    pub content: String,
    /// Distance to the query; only set on query results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
}

impl Document {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_embedding(mut self, embedding: Embedding) -> Self {
        self.embedding = Some(embedding);
        self
    }

    fn needs_embedding(&self) -> bool {
        self.embedding.as_ref().is_none_or(|e| e.is_empty())
    }
}

/// Fields a query or get response should carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Include {
    Documents,
    Embeddings,
    Metadatas,
    Distances,
}

impl Include {
    pub const ALL: [Include; 4] = [
        Include::Documents,
        Include::Embeddings,
        Include::Metadatas,
        Include::Distances,
    ];
}

/// Metric the server ranks query results by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceFunction {
    #[default]
    L2,
    Cosine,
    Ip,
}

impl DistanceFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::L2 => "l2",
            Self::Cosine => "cosine",
            Self::Ip => "ip",
        }
    }
}

impl fmt::Display for DistanceFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceFunction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "l2" => Ok(Self::L2),
            "cosine" => Ok(Self::Cosine),
            "ip" => Ok(Self::Ip),
            other => Err(Error::InvalidArgument(format!(
                "unknown distance function {other:?} (expected l2, cosine or ip)"
            ))),
        }
    }
}

/// Filters for fetching stored documents.
#[derive(Debug, Clone, Default)]
pub struct GetQuery {
    pub ids: Vec<String>,
    pub where_metadata: Option<Value>,
    pub where_document: Option<Value>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    /// Empty means the server default (documents and metadatas).
    pub include: Vec<Include>,
}

impl GetQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn where_metadata(mut self, filter: Value) -> Self {
        self.where_metadata = Some(filter);
        self
    }

    pub fn where_document(mut self, filter: Value) -> Self {
        self.where_document = Some(filter);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn include(mut self, include: &[Include]) -> Self {
        self.include = include.to_vec();
        self
    }
}

/// A similarity search by free text.
#[derive(Debug, Clone)]
pub struct SimilarityQuery {
    pub text: String,
    pub n_results: usize,
    pub where_metadata: Option<Value>,
    pub where_document: Option<Value>,
    /// Empty means all four fields.
    pub include: Vec<Include>,
}

impl SimilarityQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            n_results: 10,
            where_metadata: None,
            where_document: None,
            include: Include::ALL.to_vec(),
        }
    }

    pub fn n_results(mut self, n: usize) -> Self {
        self.n_results = n;
        self
    }

    pub fn where_metadata(mut self, filter: Value) -> Self {
        self.where_metadata = Some(filter);
        self
    }

    pub fn where_document(mut self, filter: Value) -> Self {
        self.where_document = Some(filter);
        self
    }

    pub fn include(mut self, include: &[Include]) -> Self {
        self.include = include.to_vec();
        self
    }
}

/// Handle to one named collection on the server. Holds no document state;
/// every call is a fresh round trip.
#[derive(Clone)]
pub struct Collection {
    name: String,
    id: String,
    metadata: Metadata,
    client: ChromaClient,
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("metadata", &self.metadata)
            .finish()
    }
}

impl Collection {
    pub(crate) fn from_info(info: CollectionInfo, client: ChromaClient) -> Self {
        Self {
            name: info.name,
            id: info.id,
            metadata: info.metadata.unwrap_or_default(),
            client,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Distance function from collection metadata; `l2` when unset.
    pub fn distance_function(&self) -> Result<DistanceFunction> {
        match self.metadata.get(DISTANCE_METADATA_KEY) {
            None | Some(Value::Null) => Ok(DistanceFunction::L2),
            Some(Value::String(s)) => s.parse(),
            Some(other) => Err(Error::decode(
                "collection metadata",
                format!("{DISTANCE_METADATA_KEY} is not a string: {other}"),
            )),
        }
    }

    fn url(&self, op: &str) -> String {
        self.client.url(&format!("/collections/{}/{op}", self.id))
    }

    /// Add documents. Documents without an embedding are embedded in
    /// fixed-size batches; the payload keeps the input order.
    pub fn add(&self, docs: &[Document], embedder: &dyn Embedder) -> Result<()> {
        if docs.is_empty() {
            return Ok(());
        }

        let mut embeddings: Vec<Option<Embedding>> = docs
            .iter()
            .map(|d| {
                if d.needs_embedding() {
                    None
                } else {
                    d.embedding.clone()
                }
            })
            .collect();

        let pending: Vec<usize> = (0..docs.len())
            .filter(|&i| embeddings[i].is_none())
            .collect();

        for batch in slice_batch(&pending, self.client.embed_batch_size())? {
            let texts: Vec<&str> = batch.iter().map(|&i| docs[i].content.as_str()).collect();
            let vectors = embedder.embed_documents(&texts)?;
            if vectors.len() != batch.len() {
                return Err(Error::Embedding(format!(
                    "requested {} embeddings, provider returned {}",
                    batch.len(),
                    vectors.len()
                )));
            }
            for (&i, vector) in batch.iter().zip(vectors) {
                embeddings[i] = Some(vector);
            }
        }

        let embeddings: Vec<Embedding> = embeddings
            .into_iter()
            .collect::<Option<_>>()
            .ok_or_else(|| Error::Embedding("document left without an embedding".into()))?;

        debug!(
            collection = %self.name,
            documents = docs.len(),
            embedded = pending.len(),
            "adding documents"
        );

        let request = AddRequest::new(docs, embeddings);
        let url = self.url("add");
        self.client.http().post_json(&url, &request)?.text()?;
        Ok(())
    }

    /// Fetch stored documents matching the filters.
    pub fn get(&self, query: &GetQuery) -> Result<Vec<Document>> {
        let request = GetRequest {
            ids: (!query.ids.is_empty()).then_some(query.ids.as_slice()),
            where_metadata: query.where_metadata.as_ref(),
            where_document: query.where_document.as_ref(),
            limit: query.limit,
            offset: query.offset,
            include: &query.include,
        };
        let url = self.url("get");
        let resp: GetResponse = self
            .client
            .http()
            .post_json(&url, &request)?
            .json("collection get response")?;
        Ok(resp.into_documents())
    }

    /// Embed the query text and return the nearest documents, closest first.
    pub fn query(&self, query: &SimilarityQuery, embedder: &dyn Embedder) -> Result<Vec<Document>> {
        let embedding = embedder.embed_query(&query.text)?;
        let include: &[Include] = if query.include.is_empty() {
            &Include::ALL
        } else {
            &query.include
        };
        let request = QueryRequest {
            query_embeddings: vec![embedding.as_slice()],
            n_results: query.n_results,
            where_metadata: query.where_metadata.as_ref(),
            where_document: query.where_document.as_ref(),
            include,
        };
        let url = self.url("query");
        let resp: QueryResponse = self
            .client
            .http()
            .post_json(&url, &request)?
            .json("collection query response")?;
        Ok(resp.into_documents())
    }

    /// Number of documents in the collection.
    pub fn count(&self) -> Result<usize> {
        let url = self.url("count");
        let body = self.client.http().get(&url)?.text()?;
        body.trim()
            .parse()
            .map_err(|e| Error::decode("collection count", format!("{e}: {body:?}")))
    }
}
