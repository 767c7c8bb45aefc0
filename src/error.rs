use thiserror::Error;

/// Errors returned by the ChromaDB and embeddings clients.
#[derive(Error, Debug)]
pub enum Error {
    /// The request never produced an HTTP response (DNS, connect, TLS, body read).
    #[error("transport error: {0}")]
    Transport(#[from] ureq::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded into the expected shape.
    #[error("failed to decode {context}: {message}")]
    Decode { context: String, message: String },

    /// The server reported an application error in its JSON body.
    #[error("server error: {message}")]
    Server { message: String },

    /// The embeddings provider failed or returned unusable data.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// The response body was larger than the configured limit.
    #[error("response body exceeds {limit} bytes")]
    ResponseTooLarge { limit: u64 },

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Usage or configuration error, such as a zero batch size or a missing API key.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn decode(context: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            context: context.into(),
            message: err.to_string(),
        }
    }

    /// The error text the server sent, if this failure carried one.
    ///
    /// Covers both an `{"error": ...}` object inside a success response and
    /// the same object returned alongside a failing status code.
    pub fn server_message(&self) -> Option<String> {
        match self {
            Self::Server { message } => Some(message.clone()),
            Self::Status { body, .. } => crate::http::error_message(body),
            _ => None,
        }
    }

    /// HTTP status code, when the server answered with a failing one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
