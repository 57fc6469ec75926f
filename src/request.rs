//! Request value object and the HTTP boundary adapter.
//!
//! A [`Request`] describes one action to perform: a normalized path, a
//! restricted verb, a parameter map, and the response sink the handler will
//! fill. Requests carry provenance: whether they originated inside this
//! process or arrived over the wire, and — for recursive dispatch — a
//! snapshot of the parent request and the nesting depth.
//!
//! ```no_run
//! use hmvp::{App, Request};
//!
//! # fn run(app: App) -> Result<(), hmvp::Error> {
//! let done = Request::new("/user-42/edit", Default::default()).execute(&app)?;
//! let payload = done.response.get();
//! # Ok(()) }
//! ```

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::application::Application;
use crate::error::Error;
use crate::response::{HttpResponse, Response, ResponseSink};
use crate::signature;

/// Request parameter map. Iterates in sorted key order, which doubles as the
/// stable canonical order for signatures.
pub type Params = serde_json::Map<String, Value>;

/// The restricted request verb. Anything outside this set is rejected at
/// parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Create,
    Read,
    Update,
    Delete,
}

impl Method {
    /// Lowercase wire name, as serialized between nodes.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Create => "create",
            Method::Read => "read",
            Method::Update => "update",
            Method::Delete => "delete",
        }
    }

    /// Map to the HTTP verb used by the remote wire protocol.
    #[must_use]
    pub fn to_http(self) -> http::Method {
        match self {
            Method::Create => http::Method::POST,
            Method::Read => http::Method::GET,
            Method::Update => http::Method::PUT,
            Method::Delete => http::Method::DELETE,
        }
    }

    /// Map from an HTTP verb. Verbs outside the CRUD set are rejected.
    pub fn from_http(method: &http::Method) -> Result<Self, Error> {
        match *method {
            http::Method::POST => Ok(Method::Create),
            http::Method::GET => Ok(Method::Read),
            http::Method::PUT => Ok(Method::Update),
            http::Method::DELETE => Ok(Method::Delete),
            ref other => Err(Error::configuration(format!(
                "unsupported http method {other}"
            ))),
        }
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "create" => Ok(Method::Create),
            "read" => Ok(Method::Read),
            "update" => Ok(Method::Update),
            "delete" => Ok(Method::Delete),
            other => Err(Error::configuration(format!("unsupported method {other}"))),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the request that triggered a child request. Owns nothing of
/// the parent; it exists so error reports and logs can show the chain.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Provenance {
    pub path: String,
    pub method: Method,
    pub nesting_level: u32,
}

/// An action to perform against an application, local or remote.
pub struct Request {
    path: String,
    method: Method,
    /// Request parameters; also the signature canonicalization input.
    pub params: Params,
    nesting_level: u32,
    internal: bool,
    parent: Option<Box<Provenance>>,
    /// Exclusively owned response sink. Replaceable before dispatch.
    pub response: Box<dyn ResponseSink>,
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("path", &self.path)
            .field("method", &self.method)
            .field("params", &self.params)
            .field("nesting_level", &self.nesting_level)
            .field("internal", &self.internal)
            .finish_non_exhaustive()
    }
}

fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

impl Request {
    /// An internally originated request (built by code in this process).
    /// Internal requests skip signature verification.
    #[must_use]
    pub fn new(path: &str, params: Params) -> Self {
        Self {
            path: normalize_path(path),
            method: Method::Read,
            params,
            nesting_level: 0,
            internal: true,
            parent: None,
            response: Box::new(Response::new()),
        }
    }

    /// An externally originated request (arrived over the wire). Subject to
    /// signature verification and base-path trimming.
    #[must_use]
    pub fn external(path: &str, params: Params) -> Self {
        Self {
            internal: false,
            ..Self::new(path, params)
        }
    }

    /// Boundary adapter: build an external request from an inbound HTTP
    /// method and request URI. The query string becomes the parameter map;
    /// a `method` override parameter is honored and removed.
    pub fn from_http(method: &http::Method, uri: &str) -> Result<Self, Error> {
        Self::from_http_with_body(method, uri, None)
    }

    /// Boundary adapter for requests that also carry a form-encoded body
    /// (delegated create calls arrive this way). Body parameters merge over
    /// query parameters, body taking priority.
    pub fn from_http_with_body(
        method: &http::Method,
        uri: &str,
        body: Option<&[u8]>,
    ) -> Result<Self, Error> {
        let (raw_path, raw_query) = match uri.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (uri, None),
        };
        let path = urlencoding::decode(raw_path)
            .map_err(|e| Error::configuration(format!("malformed request uri {uri}: {e}")))?;

        let mut params = Params::new();
        if let Some(query) = raw_query {
            for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
                params.insert(key.into_owned(), Value::String(value.into_owned()));
            }
        }

        let mut request = Self::external(&path, params);
        request.method = Method::from_http(method)?;

        if let Some(over) = request.params.remove("method") {
            if let Some(name) = over.as_str() {
                let http_method = http::Method::from_str(&name.to_ascii_uppercase())
                    .map_err(|_| Error::configuration(format!("unsupported method {name}")))?;
                request.method = Method::from_http(&http_method)?;
            }
        }

        if let Some(body) = body {
            for (key, value) in url::form_urlencoded::parse(body) {
                request
                    .params
                    .insert(key.into_owned(), Value::String(value.into_owned()));
            }
        }

        request.response = Box::new(HttpResponse::new());
        Ok(request)
    }

    /// Build a child request for recursive dispatch. The child records this
    /// request as its parent and sits one nesting level deeper.
    #[must_use]
    pub fn child(&self, path: &str, params: Params) -> Self {
        let mut child = Self::new(path, params);
        child.nesting_level = self.nesting_level + 1;
        child.parent = Some(Box::new(Provenance {
            path: self.path.clone(),
            method: self.method,
            nesting_level: self.nesting_level,
        }));
        child
    }

    /// Run this request against an application and hand it back so the
    /// caller can read the sink. Local applications translate every failure
    /// into the sink and return `Ok`; remote applications propagate
    /// remote-originated failures as `Err`.
    pub fn execute(mut self, application: &dyn Application) -> Result<Self, Error> {
        application.execute(&mut self)?;
        Ok(self)
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn set_path(&mut self, path: &str) {
        self.path = normalize_path(path);
    }

    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    #[must_use]
    pub fn nesting_level(&self) -> u32 {
        self.nesting_level
    }

    pub fn set_nesting_level(&mut self, nesting_level: u32) {
        self.nesting_level = nesting_level;
    }

    #[must_use]
    pub fn parent(&self) -> Option<&Provenance> {
        self.parent.as_deref()
    }

    /// `true` for requests generated by code within this process.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        self.internal
    }

    /// Replace the response sink. Only meaningful before dispatch.
    pub fn set_response(&mut self, response: Box<dyn ResponseSink>) {
        self.response = response;
    }

    /// Attach a `request_signature` parameter computed from the shared
    /// secret and the current path/params.
    pub fn apply_signature(&mut self, secret: &str) {
        let digest = signature::compute(secret, &self.path, &self.params);
        self.params
            .insert(signature::SIGNATURE_PARAM.to_string(), Value::String(digest));
    }

    /// Verify the `request_signature` parameter against the shared secret.
    /// Internally originated requests skip verification entirely.
    pub fn verify_signature(&self, secret: &str) -> Result<(), Error> {
        if self.internal {
            return Ok(());
        }

        let passed = self
            .params
            .get(signature::SIGNATURE_PARAM)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                Error::authentication("request signature is required in order to call methods")
            })?;

        if passed != signature::compute(secret, &self.path, &self.params) {
            return Err(Error::authentication("invalid request signature"));
        }
        Ok(())
    }

    /// Strip a configured base-path prefix. An empty remainder renormalizes
    /// to `/`.
    pub fn trim_base_path(&mut self, base: &str) -> Result<(), Error> {
        let base = base.trim_end_matches('/');
        let Some(rest) = self.path.strip_prefix(base) else {
            return Err(Error::configuration(format!(
                "current path is different than base path {}",
                self.path
            )));
        };
        self.path = normalize_path(rest);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn method_names_round_trip() {
        for name in ["create", "read", "update", "delete"] {
            let method: Method = name.parse().expect("supported method");
            assert_eq!(method.as_str(), name);
        }
        assert!("patch".parse::<Method>().is_err());
        assert!(Method::from_http(&http::Method::PATCH).is_err());
    }

    #[test]
    fn paths_are_normalized() {
        assert_eq!(Request::new("", Params::new()).path(), "/");
        assert_eq!(Request::new("user/5", Params::new()).path(), "/user/5");
    }

    #[test]
    fn child_tracks_nesting_and_parent() {
        let parent = Request::new("/a", Params::new());
        let child = parent.child("/b", Params::new());
        let grandchild = child.child("/c", Params::new());

        assert_eq!(child.nesting_level(), 1);
        assert_eq!(grandchild.nesting_level(), 2);
        let provenance = grandchild.parent().expect("parent recorded");
        assert_eq!(provenance.path, "/b");
        assert_eq!(provenance.nesting_level, 1);
        assert!(grandchild.is_internal());
    }

    #[test]
    fn from_http_parses_query_and_method_override() {
        let request =
            Request::from_http(&http::Method::GET, "/user/5?limit=3&method=PUT").expect("adapter");
        assert_eq!(request.path(), "/user/5");
        assert_eq!(request.method(), Method::Update);
        assert_eq!(request.params.get("limit"), Some(&json!("3")));
        assert!(!request.params.contains_key("method"));
        assert!(!request.is_internal());
        assert_eq!(request.response.status(), Some(http::StatusCode::OK));
    }

    #[test]
    fn form_body_params_merge_over_query_params() {
        let request = Request::from_http_with_body(
            &http::Method::POST,
            "/user?name=query&limit=3",
            Some(b"name=body&extra=1"),
        )
        .expect("adapter");

        assert_eq!(request.method(), Method::Create);
        assert_eq!(request.params.get("name"), Some(&json!("body")));
        assert_eq!(request.params.get("limit"), Some(&json!("3")));
        assert_eq!(request.params.get("extra"), Some(&json!("1")));
    }

    #[test]
    fn trim_base_path_strips_prefix() {
        let mut request = Request::external("/nodes/a/user/1", Params::new());
        request.trim_base_path("/nodes/a/").expect("prefix matches");
        assert_eq!(request.path(), "/user/1");

        let mut root = Request::external("/nodes/a", Params::new());
        root.trim_base_path("/nodes/a").expect("prefix matches");
        assert_eq!(root.path(), "/");

        let mut other = Request::external("/elsewhere", Params::new());
        assert!(other.trim_base_path("/nodes/a").is_err());
    }
}
