//! HTTP delegation to an application running on another node.
//!
//! A [`RemoteApplication`] implements the same [`Application`] contract as
//! a local [`App`](crate::application::App), but forwards each request over
//! HTTP to a peer node and writes the decoded JSON body into the response
//! sink. From the caller's perspective the two are interchangeable.
//!
//! Unlike a local application, a remote one re-raises remote-originated
//! failures as [`Error::Remote`] so the proxying side can translate them at
//! its own boundary.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::application::Application;
use crate::error::Error;
use crate::request::Request;
use crate::response::{FORMAT_PARAM, JSON_FORMAT};
use crate::signature;

/// Wire timeout applied to every delegated call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// A peer node reachable over HTTP, addressed by scheme and host.
///
/// The node's base path, if any, is configured separately with
/// [`RemoteApplication::base_path`] so the server descriptor stays a pure
/// origin.
pub struct RemoteApplication {
    server: Url,
    base_path: String,
    client_secret: Option<String>,
    client: reqwest::blocking::Client,
}

impl RemoteApplication {
    /// Build a remote application for a server origin such as
    /// `https://api.example.com`. The URL must carry a scheme and host and
    /// nothing else; a path belongs in [`base_path`](Self::base_path).
    pub fn new(server: &str) -> Result<Self, Error> {
        let url = Url::parse(server)
            .map_err(|e| Error::configuration(format!("invalid server url {server}: {e}")))?;
        if url.host_str().is_none() {
            return Err(Error::configuration(format!(
                "server url has no host: {server}"
            )));
        }
        if !matches!(url.path(), "" | "/") {
            return Err(Error::configuration(format!(
                "server url must not carry a path, configure base_path instead: {server}"
            )));
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::configuration(format!("http client setup failed: {e}")))?;

        Ok(Self {
            server: url,
            base_path: String::new(),
            client_secret: None,
            client,
        })
    }

    /// Prefix every delegated path with a base path mounted on the peer.
    #[must_use]
    pub fn base_path(mut self, base_path: &str) -> Self {
        self.base_path = base_path.trim_end_matches('/').to_string();
        self
    }

    /// Sign every delegated request with the peer's shared secret.
    #[must_use]
    pub fn client_secret(mut self, secret: &str) -> Self {
        self.client_secret = Some(secret.to_string());
        self
    }

    #[must_use]
    pub fn server(&self) -> &Url {
        &self.server
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}{}{}",
            self.server.as_str().trim_end_matches('/'),
            self.base_path,
            path
        )
    }

    fn send(&self, request: &mut Request) -> Result<reqwest::blocking::Response, Error> {
        request.params.insert(
            FORMAT_PARAM.to_string(),
            Value::String(JSON_FORMAT.to_string()),
        );
        if let Some(secret) = &self.client_secret {
            // The peer verifies the path as it arrives on the wire, before
            // trimming its base path, so the signature covers the prefix.
            let wire_path = format!("{}{}", self.base_path, request.path());
            let digest = signature::compute(secret, &wire_path, &request.params);
            request.params.insert(
                signature::SIGNATURE_PARAM.to_string(),
                Value::String(digest),
            );
        }

        let method = request.method().to_http();
        let endpoint = self.endpoint(request.path());
        let query = signature::encode_query(&request.params);
        debug!(method = %method, endpoint = %endpoint, "Delegating request");

        // Only POST carries a body; everything else sends params as the
        // query string.
        let builder = if method == http::Method::POST {
            self.client
                .request(method, endpoint)
                .header(
                    "Content-Type",
                    "application/x-www-form-urlencoded; charset=utf-8",
                )
                .body(query)
        } else {
            let separator = if query.is_empty() { "" } else { "?" };
            self.client
                .request(method, format!("{endpoint}{separator}{query}"))
        };

        builder
            .send()
            .map_err(|e| Error::remote(format!("remote request failed: {e}"), None))
    }
}

impl Application for RemoteApplication {
    fn execute(&self, request: &mut Request) -> Result<(), Error> {
        let response = self.send(request)?;
        let status = response.status();
        let raw = response
            .text()
            .map_err(|e| Error::remote(format!("unable to read remote response: {e}"), None))?;

        let decoded: Value = serde_json::from_str(&raw).map_err(|_| {
            Error::remote(format!("unable to parse response json: {raw}"), None)
        })?;

        if !status.is_success() {
            let message = decoded
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| raw.clone());
            warn!(
                status = status.as_u16(),
                path = %request.path(),
                "Remote node reported an error"
            );
            return Err(Error::remote(message, Some(decoded)));
        }

        info!(
            status = status.as_u16(),
            path = %request.path(),
            "Remote dispatch complete"
        );
        request.response.set(decoded);
        Ok(())
    }
}
