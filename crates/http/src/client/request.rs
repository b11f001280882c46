//! Outbound request descriptor
//!
//! Requests are described rather than built directly on a
//! `reqwest::RequestBuilder` so they can be re-issued after a session refresh.
//! A descriptor remembers whether it is the first attempt or a replay, and a
//! replay can only be derived from a first attempt, which bounds every request
//! to a single refresh.

use super::ClientError;
use bytes::Bytes;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde::Serialize;

/// Which attempt a descriptor represents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    /// First time the request is sent
    Initial,
    /// Re-issued once after a session refresh
    Replay,
}

/// Method, path, headers and body of an API call
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Option<Bytes>,
    attempt: Attempt,
    bearer: Option<String>,
}

impl RequestDescriptor {
    /// Describe a first attempt at `method path`
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            attempt: Attempt::Initial,
            bearer: None,
        }
    }

    /// Add a header
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Append a query parameter
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set a JSON body
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be serialized
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ClientError> {
        let bytes = serde_json::to_vec(body)?;
        self.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        self.body = Some(Bytes::from(bytes));
        Ok(self)
    }

    /// Set a raw body
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub const fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub const fn body_bytes(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub const fn attempt(&self) -> Attempt {
        self.attempt
    }

    pub fn is_replay(&self) -> bool {
        self.attempt == Attempt::Replay
    }

    /// Token explicitly attached for a replay, overriding the stored one
    pub(crate) fn bearer(&self) -> Option<&str> {
        self.bearer.as_deref()
    }

    /// Derive the replay of this request carrying `token`
    ///
    /// Returns `None` when this descriptor is already a replay.
    pub fn replay_with(&self, token: &str) -> Option<Self> {
        match self.attempt {
            Attempt::Initial => Some(Self {
                attempt: Attempt::Replay,
                bearer: Some(token.to_string()),
                ..self.clone()
            }),
            Attempt::Replay => None,
        }
    }
}
