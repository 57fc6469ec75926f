//! Response sinks.
//!
//! A handler does not write to a socket; it fills a [`ResponseSink`], an
//! append-only key/value container owned by the request. Rendering the sink
//! to a concrete wire form (template, redirect, raw bytes) is a strategy
//! external to this crate; the one rendering the engine itself needs — JSON
//! for the remote wire protocol — lives on [`HttpResponse`].

use http::StatusCode;
use serde_json::{Map, Value};

use crate::error::Error;

/// Reserved request parameter selecting the wire rendering of the response.
pub const FORMAT_PARAM: &str = "response_format";
/// Value of [`FORMAT_PARAM`] requesting JSON, forced on all remote calls.
pub const JSON_FORMAT: &str = "json";

/// Append-only key/value container a handler fills during dispatch.
///
/// The status-code methods are a capability: plain sinks ignore status
/// writes and report `None`, HTTP-backed sinks store and expose them.
pub trait ResponseSink: Send {
    /// Discard all accumulated output.
    fn clear(&mut self);

    /// Replace the whole payload.
    fn set(&mut self, value: Value);

    /// Current payload.
    fn get(&self) -> &Value;

    /// Set a single top-level key. A non-object payload is replaced by an
    /// object containing only this key.
    fn insert(&mut self, key: &str, value: Value);

    /// Status-code capability; plain sinks ignore this.
    fn set_status(&mut self, _status: StatusCode) {}

    /// `None` when the sink has no status-code support.
    fn status(&self) -> Option<StatusCode> {
        None
    }
}

fn insert_into(container: &mut Value, key: &str, value: Value) {
    if !container.is_object() {
        *container = Value::Object(Map::new());
    }
    if let Some(map) = container.as_object_mut() {
        map.insert(key.to_string(), value);
    }
}

/// Plain sink without status-code support.
#[derive(Debug, Default)]
pub struct Response {
    container: Value,
}

impl Response {
    #[must_use]
    pub fn new() -> Self {
        Self {
            container: Value::Object(Map::new()),
        }
    }
}

impl ResponseSink for Response {
    fn clear(&mut self) {
        self.container = Value::Object(Map::new());
    }

    fn set(&mut self, value: Value) {
        self.container = value;
    }

    fn get(&self) -> &Value {
        &self.container
    }

    fn insert(&mut self, key: &str, value: Value) {
        insert_into(&mut self.container, key, value);
    }
}

/// Sink with status-code support and a JSON body renderer.
#[derive(Debug)]
pub struct HttpResponse {
    container: Value,
    status: StatusCode,
    pretty: bool,
}

impl Default for HttpResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpResponse {
    #[must_use]
    pub fn new() -> Self {
        Self {
            container: Value::Object(Map::new()),
            status: StatusCode::OK,
            pretty: false,
        }
    }

    /// Render the body with indentation; intended for interactive debugging.
    pub fn set_pretty(&mut self, pretty: bool) {
        self.pretty = pretty;
    }

    /// Render the payload as a JSON string.
    pub fn to_json_string(&self) -> Result<String, Error> {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(&self.container)
        } else {
            serde_json::to_string(&self.container)
        };
        rendered.map_err(|e| Error::configuration(format!("unable to render response: {e}")))
    }
}

impl ResponseSink for HttpResponse {
    fn clear(&mut self) {
        self.container = Value::Object(Map::new());
    }

    fn set(&mut self, value: Value) {
        self.container = value;
    }

    fn get(&self) -> &Value {
        &self.container
    }

    fn insert(&mut self, key: &str, value: Value) {
        insert_into(&mut self.container, key, value);
    }

    fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn status(&self) -> Option<StatusCode> {
        Some(self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_sink_ignores_status() {
        let mut sink = Response::new();
        sink.set_status(StatusCode::NOT_FOUND);
        assert_eq!(sink.status(), None);
    }

    #[test]
    fn http_sink_tracks_status() {
        let mut sink = HttpResponse::new();
        assert_eq!(sink.status(), Some(StatusCode::OK));
        sink.set_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(sink.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[test]
    fn insert_replaces_non_object_payload() {
        let mut sink = Response::new();
        sink.set(json!(42));
        sink.insert("error", json!({"message": "boom"}));
        assert_eq!(sink.get()["error"]["message"], json!("boom"));
    }

    #[test]
    fn clear_discards_partial_output() {
        let mut sink = Response::new();
        sink.insert("partial", json!(1));
        sink.clear();
        assert_eq!(sink.get(), &json!({}));
    }
}
