use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Document, Include, Metadata};
use crate::embed::Embedding;

/// Collection description as returned by `/collections` endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct CollectionInfo {
    pub name: String,
    pub id: String,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateCollectionRequest<'a> {
    pub name: &'a str,
    pub metadata: &'a Metadata,
    pub get_or_create: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct AddRequest<'a> {
    pub ids: Vec<&'a str>,
    pub embeddings: Vec<Embedding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadatas: Option<Vec<Option<&'a Metadata>>>,
    pub documents: Vec<&'a str>,
}

impl<'a> AddRequest<'a> {
    /// `embeddings` must line up with `docs` by position.
    pub fn new(docs: &'a [Document], embeddings: Vec<Embedding>) -> Self {
        let metadatas = if docs.iter().any(|d| d.metadata.is_some()) {
            Some(docs.iter().map(|d| d.metadata.as_ref()).collect())
        } else {
            None
        };
        Self {
            ids: docs.iter().map(|d| d.id.as_str()).collect(),
            embeddings,
            metadatas,
            documents: docs.iter().map(|d| d.content.as_str()).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct GetRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids: Option<&'a [String]>,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_metadata: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub where_document: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    #[serde(skip_serializing_if = "no_fields")]
    pub include: &'a [Include],
}

#[derive(Debug, Serialize)]
pub(crate) struct QueryRequest<'a> {
    pub query_embeddings: Vec<&'a [f32]>,
    pub n_results: usize,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_metadata: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub where_document: Option<&'a Value>,
    pub include: &'a [Include],
}

/// Column-wise records returned by `/get`. Columns that were not included
/// come back as `null`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct GetResponse {
    #[serde(default)]
    pub ids: Vec<String>,
    #[serde(default)]
    pub embeddings: Option<Vec<Option<Embedding>>>,
    #[serde(default)]
    pub metadatas: Option<Vec<Option<Metadata>>>,
    #[serde(default)]
    pub documents: Option<Vec<Option<String>>>,
}

impl GetResponse {
    /// Turn columns into one `Document` per id, in server order.
    pub fn into_documents(mut self) -> Vec<Document> {
        std::mem::take(&mut self.ids)
            .into_iter()
            .enumerate()
            .map(|(i, id)| Document {
                id,
                embedding: take_cell(&mut self.embeddings, i),
                metadata: take_cell(&mut self.metadatas, i),
                content: take_cell(&mut self.documents, i).unwrap_or_default(),
                distance: None,
            })
            .collect()
    }
}

type Nested<T> = Option<Vec<Vec<Option<T>>>>;

/// Query results indexed `[query][rank]`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct QueryResponse {
    #[serde(default)]
    pub ids: Vec<Vec<String>>,
    #[serde(default)]
    pub embeddings: Nested<Embedding>,
    #[serde(default)]
    pub metadatas: Nested<Metadata>,
    #[serde(default)]
    pub documents: Nested<String>,
    #[serde(default)]
    pub distances: Nested<f32>,
}

impl QueryResponse {
    /// Flatten into documents, query-major then rank-minor. Optional columns
    /// may be absent or shorter than `ids` at either level.
    pub fn into_documents(mut self) -> Vec<Document> {
        let mut docs = Vec::new();
        for (q, ids) in std::mem::take(&mut self.ids).into_iter().enumerate() {
            for (r, id) in ids.into_iter().enumerate() {
                docs.push(Document {
                    id,
                    embedding: take_nested(&mut self.embeddings, q, r),
                    metadata: take_nested(&mut self.metadatas, q, r),
                    content: take_nested(&mut self.documents, q, r).unwrap_or_default(),
                    distance: take_nested(&mut self.distances, q, r),
                });
            }
        }
        docs
    }
}

fn no_fields(include: &&[Include]) -> bool {
    include.is_empty()
}

fn take_cell<T>(column: &mut Option<Vec<Option<T>>>, i: usize) -> Option<T> {
    column.as_mut()?.get_mut(i)?.take()
}

fn take_nested<T>(column: &mut Nested<T>, q: usize, r: usize) -> Option<T> {
    column.as_mut()?.get_mut(q)?.get_mut(r)?.take()
}
