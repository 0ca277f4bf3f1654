//! Response recorder handed to the page handler.
//!
//! Handlers written against a raw HTTP server call `write`/`end`; handlers
//! written against a small REST framework call `status`/`json`/`send`. The
//! recorder implements both method sets and simply accumulates the result.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use shared::http::{APPLICATION_JSON, CONTENT_TYPE, TEXT_HTML};
use tracing::warn;

use crate::request::StreamLifecycle;

/// Low-level response surface of a raw HTTP server.
pub trait NodeResponse {
    fn status_code(&self) -> u16;

    fn set_status_code(&mut self, code: u16);

    /// Header names are case-insensitive; the latest value wins.
    fn set_header(&mut self, name: &str, value: impl Into<String>);

    fn get_header(&self, name: &str) -> Option<&str>;

    fn remove_header(&mut self, name: &str) -> Option<String>;

    /// Headers keyed by lower-cased name.
    fn headers(&self) -> &BTreeMap<String, String>;

    /// Append a chunk to the body. Returns `false` once the response has ended.
    fn write(&mut self, chunk: &str) -> bool;

    /// Finish the response, optionally appending a last chunk.
    fn end(&mut self, chunk: Option<&str>);

    fn finished(&self) -> bool;
}

/// High-level helpers of a REST framework response.
pub trait ExpressResponse {
    fn status(&mut self, code: u16) -> &mut Self;

    /// Set a JSON content type and finish with the serialized payload.
    fn json<T: Serialize + ?Sized>(&mut self, payload: &T) -> Result<(), serde_json::Error>;

    /// Finish with raw text, or hand structured payloads to [`json`](Self::json).
    fn send(&mut self, payload: impl Into<SendPayload>) -> Result<(), serde_json::Error>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum SendPayload {
    Text(String),
    Json(Value),
}

impl From<&str> for SendPayload {
    fn from(text: &str) -> Self {
        SendPayload::Text(text.to_string())
    }
}

impl From<String> for SendPayload {
    fn from(text: String) -> Self {
        SendPayload::Text(text)
    }
}

impl From<Value> for SendPayload {
    fn from(value: Value) -> Self {
        SendPayload::Json(value)
    }
}

#[derive(Debug, Clone)]
pub struct ResponseRecorder {
    status_code: u16,
    headers: BTreeMap<String, String>,
    body: String,
    ended: bool,
}

impl Default for ResponseRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseRecorder {
    pub fn new() -> Self {
        Self {
            status_code: 200,
            headers: BTreeMap::new(),
            body: String::new(),
            ended: false,
        }
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn into_parts(self) -> (BTreeMap<String, String>, String) {
        (self.headers, self.body)
    }
}

impl NodeResponse for ResponseRecorder {
    fn status_code(&self) -> u16 {
        self.status_code
    }

    fn set_status_code(&mut self, code: u16) {
        self.status_code = code;
    }

    fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    fn remove_header(&mut self, name: &str) -> Option<String> {
        self.headers.remove(&name.to_ascii_lowercase())
    }

    fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    fn write(&mut self, chunk: &str) -> bool {
        if self.ended {
            warn!(bytes = chunk.len(), "write after end ignored");
            return false;
        }
        self.body.push_str(chunk);
        true
    }

    fn end(&mut self, chunk: Option<&str>) {
        if let Some(chunk) = chunk {
            self.write(chunk);
        }
        self.ended = true;
    }

    fn finished(&self) -> bool {
        self.ended
    }
}

impl ExpressResponse for ResponseRecorder {
    fn status(&mut self, code: u16) -> &mut Self {
        self.set_status_code(code);
        self
    }

    fn json<T: Serialize + ?Sized>(&mut self, payload: &T) -> Result<(), serde_json::Error> {
        let body = serde_json::to_string(payload)?;
        self.set_header(CONTENT_TYPE, APPLICATION_JSON);
        self.end(Some(&body));
        Ok(())
    }

    fn send(&mut self, payload: impl Into<SendPayload>) -> Result<(), serde_json::Error> {
        match payload.into() {
            SendPayload::Json(value) => self.json(&value),
            SendPayload::Text(text) => {
                if self.get_header(CONTENT_TYPE).is_none() {
                    self.set_header(CONTENT_TYPE, TEXT_HTML);
                }
                self.end(Some(&text));
                Ok(())
            }
        }
    }
}

impl StreamLifecycle for ResponseRecorder {}
