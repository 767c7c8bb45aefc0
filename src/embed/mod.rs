pub mod openai;

use crate::error::{Error, Result};

pub type Embedding = Vec<f32>;

/// A text embedding provider.
///
/// Collections take `&dyn Embedder` so a deterministic in-process
/// implementation can stand in for a network provider.
pub trait Embedder: Send + Sync {
    /// Embed several texts, returning one vector per text in input order.
    fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Embedding>>;

    /// Embed a single text as a batch of one.
    fn embed_query(&self, text: &str) -> Result<Embedding> {
        self.embed_documents(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("provider returned no embeddings".into()))
    }

    fn model_name(&self) -> &str;
}
