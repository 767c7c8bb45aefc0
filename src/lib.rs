//! Blocking client for the ChromaDB REST API.
//!
//! [`ChromaClient`] talks to the server and hands out [`Collection`] handles.
//! Documents added without an embedding are embedded through an
//! [`Embedder`], such as [`OpenAiEmbedder`].
//!
//! ```no_run
//! use chroma_client::{ChromaClient, DistanceFunction, Document, OpenAiEmbedder, SimilarityQuery};
//!
//! # fn main() -> chroma_client::Result<()> {
//! let client = ChromaClient::new("http://localhost:8000")?;
//! let embedder = OpenAiEmbedder::from_env()?;
//! let notes = client.get_or_create_collection("notes", DistanceFunction::L2, None)?;
//! notes.add(&[Document::new("n1", "buy milk")], &embedder)?;
//! for hit in notes.query(&SimilarityQuery::new("groceries").n_results(3), &embedder)? {
//!     println!("{} {:?}", hit.id, hit.distance);
//! }
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod client;
pub mod collection;
pub mod config;
pub mod embed;
pub mod error;
mod http;

pub use batch::slice_batch;
pub use client::{ChromaClient, ClientOptions};
pub use collection::{
    Collection, DistanceFunction, Document, GetQuery, Include, Metadata, SimilarityQuery,
};
pub use config::Config;
pub use embed::openai::OpenAiEmbedder;
pub use embed::{Embedder, Embedding};
pub use error::{Error, Result};
