#![allow(dead_code)]

use chroma_client::{ChromaClient, ClientOptions, Collection, Embedder, Embedding, Result};
use serde_json::{Value, json};
use std::sync::Mutex;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Deterministic embedder: `[len(text), 1.1, 2.2]`. Records batch sizes.
#[derive(Default)]
pub struct LengthEmbedder {
    pub batches: Mutex<Vec<usize>>,
}

impl LengthEmbedder {
    pub fn vector(text: &str) -> Embedding {
        vec![text.len() as f32, 1.1, 2.2]
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap().clone()
    }
}

impl Embedder for LengthEmbedder {
    fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        self.batches.lock().unwrap().push(texts.len());
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn model_name(&self) -> &str {
        "length"
    }
}

/// Run blocking client code off the async runtime driving the mock server.
pub async fn blocking<F, T>(f: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .expect("blocking task panicked")
}

pub fn collection_json(name: &str, id: &str) -> Value {
    json!({
        "name": name,
        "id": id,
        "metadata": {"hnsw:space": "l2"},
        "tenant": "default_tenant",
        "database": "default_database"
    })
}

/// Serve `GET /collections/{name}` and return a handle for it.
pub async fn mounted_collection(server: &MockServer, name: &str, id: &str) -> Collection {
    mounted_collection_with(server, name, id, ClientOptions::default()).await
}

pub async fn mounted_collection_with(
    server: &MockServer,
    name: &str,
    id: &str,
    options: ClientOptions,
) -> Collection {
    Mock::given(method("GET"))
        .and(path(format!("/api/v1/collections/{name}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(collection_json(name, id)))
        .mount(server)
        .await;

    let uri = server.uri();
    let name = name.to_string();
    blocking(move || ChromaClient::with_options(&uri, options)?.get_collection(&name))
        .await
        .unwrap()
}
