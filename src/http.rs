use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use ureq::http::Response;
use ureq::{Agent, Body};

use crate::error::{Error, Result};

/// Build an agent that hands back non-2xx responses instead of erroring, so
/// callers can inspect the body of a failed request.
pub(crate) fn agent(timeout: Option<Duration>) -> Agent {
    let config = Agent::config_builder()
        .http_status_as_error(false)
        .timeout_global(timeout)
        .build();
    Agent::new_with_config(config)
}

/// An agent paired with the largest response body it will read.
#[derive(Clone)]
pub(crate) struct HttpClient {
    agent: Agent,
    body_limit: u64,
}

impl HttpClient {
    /// `body_limit` of `None` reads bodies of any size.
    pub fn new(timeout: Option<Duration>, body_limit: Option<u64>) -> Self {
        Self::with_agent(agent(timeout), body_limit)
    }

    pub fn with_agent(agent: Agent, body_limit: Option<u64>) -> Self {
        Self {
            agent,
            body_limit: body_limit.unwrap_or(u64::MAX),
        }
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn read(&self, method: &str, url: &str, response: Response<Body>) -> Result<RawResponse> {
        RawResponse::read(method, url, response, self.body_limit)
    }

    pub fn get(&self, url: &str) -> Result<RawResponse> {
        let response = self.agent.get(url).call()?;
        self.read("GET", url, response)
    }

    pub fn delete(&self, url: &str) -> Result<RawResponse> {
        let response = self.agent.delete(url).call()?;
        self.read("DELETE", url, response)
    }

    pub fn post_empty(&self, url: &str) -> Result<RawResponse> {
        let response = self.agent.post(url).send_empty()?;
        self.read("POST", url, response)
    }

    pub fn post_json<T: Serialize>(&self, url: &str, body: &T) -> Result<RawResponse> {
        let response = self.agent.post(url).send_json(body)?;
        self.read("POST", url, response)
    }
}

/// A fully read response: status code plus raw body text.
#[derive(Debug)]
pub(crate) struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn read(
        method: &str,
        url: &str,
        mut response: Response<Body>,
        limit: u64,
    ) -> Result<Self> {
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .with_config()
            .limit(limit)
            .read_to_string()
            .map_err(|e| match e {
                ureq::Error::BodyExceedsLimit(limit) => Error::ResponseTooLarge { limit },
                other => Error::Transport(other),
            })?;
        debug!(method, url, status, bytes = body.len(), "chroma http exchange");
        Ok(Self { status, body })
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Fail with the status code and raw body unless the status is 2xx.
    pub fn into_success(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::Status {
                status: self.status,
                body: self.body,
            })
        }
    }

    /// Body of a successful response. An `{"error": ...}` object inside a
    /// 2xx response is surfaced as [`Error::Server`].
    pub fn text(self) -> Result<String> {
        let resp = self.into_success()?;
        if let Some(message) = error_message(&resp.body) {
            warn!(%message, "server reported an error in a success response");
            return Err(Error::Server { message });
        }
        Ok(resp.body)
    }

    pub fn json<T: DeserializeOwned>(self, context: &str) -> Result<T> {
        let body = self.text()?;
        serde_json::from_str(&body).map_err(|e| Error::decode(context, e))
    }
}

/// Extract the message from an `{"error": ...}` body. Newer servers send
/// `{"error": "<kind>", "message": "<text>"}`; both parts are kept.
pub(crate) fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body.trim()).ok()?;
    let error = value.as_object()?.get("error")?;
    let error = match error {
        Value::String(s) => s.clone(),
        Value::Null => return None,
        other => other.to_string(),
    };
    match value.get("message").and_then(Value::as_str) {
        Some(message) if !message.is_empty() => Some(format!("{error}: {message}")),
        _ => Some(error),
    }
}

/// Interpret a body that is either a bare boolean literal or an error object.
/// The literal is tried first; content-type is ignored.
pub(crate) fn parse_bool_or_error(body: &str) -> Result<bool> {
    match body.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => match error_message(other) {
            Some(message) => Err(Error::Server { message }),
            None => Err(Error::decode(
                "boolean response",
                format!("unexpected body {other:?}"),
            )),
        },
    }
}

/// Strip whitespace and surrounding quotes from a bare JSON string body.
pub(crate) fn strip_quotes(body: &str) -> String {
    body.trim().trim_matches('"').to_string()
}
