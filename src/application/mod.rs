//! # Application Module
//!
//! An application is the agent that executes requests: it routes them,
//! invokes the resolved presenter or handler, and translates every failure
//! into a structured error block in the response sink. The [`Application`]
//! trait is the shared dispatch contract; [`App`] executes locally, while
//! [`RemoteApplication`](crate::remote::RemoteApplication) forwards the
//! same contract to another node over HTTP.
//!
//! ## Dispatch loop
//!
//! For every request, in order: verify the shared-secret signature
//! (externally originated requests only), trim the configured base path,
//! run the one-time init hook, enforce the recursion ceiling, match the
//! route, and invoke the handler. Any failure along the way is caught at
//! the `execute` boundary and written into the sink by
//! [`App::handle_error`] — a local application never raises out of
//! `execute`.

mod core;

pub use core::{App, AppDelegate, Application, Environment, MAX_NESTING_LEVEL};
