//! # hmvp
//!
//! A hierarchical request-dispatch engine. A node assembles an
//! [`App`] from a read-only [`Config`], a [`Router`], and a set of
//! registered presenters, then feeds it [`Request`] values; the engine
//! routes each request, runs the matched handler or presenter lifecycle,
//! and leaves the result in the request's response sink. Every dispatch
//! failure is translated into a structured `error` block rather than
//! raised at the caller.
//!
//! The same dispatch contract extends across nodes:
//! [`RemoteApplication`] implements [`Application`] by forwarding requests
//! over HTTP with shared-secret signatures, so a handler can call into a
//! peer node exactly as it would call into its own process. A recursion
//! ceiling ([`MAX_NESTING_LEVEL`]) guards the resulting local-or-remote
//! dispatch chains against mutual recursion.
//!
//! ## Routing
//!
//! Rules are tried in registration order and the first match wins:
//!
//! - **literal** — exact, case-sensitive path comparison
//! - **pattern** — a regex over the path, captures become route params
//! - **predicate** — an arbitrary function of the request
//! - **structured (MVP)** — parses `/presenter/action/extended...` paths
//!   and resolves a presenter from the registry; at most one per router,
//!   registered last
//!
//! ## Quick start
//!
//! ```no_run
//! use hmvp::{App, Application, Config, Params, Request, Router};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), hmvp::Error> {
//! let mut router = Router::new();
//! router.add("/ping", |_, _, _| Ok(Some(json!({"pong": true}))))?;
//!
//! let mut app = App::new(Config::new())?;
//! app.set_router(router);
//!
//! let done = Request::new("/ping", Params::new()).execute(&app)?;
//! assert_eq!(done.response.get()["pong"], json!(true));
//! # Ok(()) }
//! ```

pub mod application;
pub mod config;
pub mod error;
pub mod presenter;
pub mod remote;
pub mod request;
pub mod response;
pub mod router;
pub mod signature;

pub use application::{App, AppDelegate, Application, Environment, MAX_NESTING_LEVEL};
pub use config::Config;
pub use error::Error;
pub use presenter::{unknown_action, Presenter, PresenterContext, PresenterRegistry};
pub use remote::RemoteApplication;
pub use request::{Method, Params, Provenance, Request};
pub use response::{HttpResponse, Response, ResponseSink, FORMAT_PARAM, JSON_FORMAT};
pub use router::{MvpParams, RouteMatch, RouteParams, Router};
