//! Error taxonomy for the dispatch engine.
//!
//! Every failure that can occur during dispatch is one of a closed set of
//! kinds. Failures never escape a local application's `execute` boundary as
//! raised errors; they are translated into a structured `error` block in the
//! response sink by [`App::handle_error`](crate::application::App::handle_error).
//! Remote applications are the one exception: they re-raise remote-originated
//! failures so a proxying node can apply the same translation at its own
//! boundary.

use http::StatusCode;

/// A dispatch failure.
///
/// The `kind()` name of the variant becomes the `type` field of the error
/// envelope written into the response sink.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No route matched, or a structured route resolved to an unknown
    /// presenter or action. The only non-fatal kind; maps to 404.
    #[error("{0}")]
    NotFound(String),

    /// Missing router, malformed remote-node descriptor, unsupported method
    /// name, or a route-registration ordering violation.
    #[error("{0}")]
    Configuration(String),

    /// The recursion ceiling was hit. This is the deadlock guard for
    /// local-or-remote dispatch chains (A calls B calls A).
    #[error("maximum request nesting level reached ({0})")]
    NestingTooDeep(u32),

    /// Missing or invalid request signature on an externally originated
    /// request. Fatal and non-retryable.
    #[error("{0}")]
    Authentication(String),

    /// A remote node returned a non-success status or an unparseable body.
    /// Carries the decoded remote error message when one was available.
    #[error("{message}")]
    Remote {
        message: String,
        /// Decoded response body, when the remote side returned valid JSON.
        body: Option<serde_json::Value>,
    },

    /// A failure raised inside a handler or presenter lifecycle method.
    #[error(transparent)]
    Handler(#[from] anyhow::Error),
}

impl Error {
    pub fn not_found(message: impl Into<String>) -> Self {
        Error::NotFound(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Error::Authentication(message.into())
    }

    pub fn remote(message: impl Into<String>, body: Option<serde_json::Value>) -> Self {
        Error::Remote {
            message: message.into(),
            body,
        }
    }

    /// HTTP-style status classification applied to sinks that support
    /// status codes.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short kind name, used as the `type` field of the error envelope.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "NotFound",
            Error::Configuration(_) => "Configuration",
            Error::NestingTooDeep(_) => "NestingTooDeep",
            Error::Authentication(_) => "Authentication",
            Error::Remote { .. } => "Remote",
            Error::Handler(_) => "Handler",
        }
    }

    /// Fatal errors are logged at `error!` level; a plain not-found is
    /// expected traffic and only rates a `warn!`.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::NotFound(_))
    }
}
