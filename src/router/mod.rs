//! # Router Module
//!
//! The router owns an ordered list of route rules and classifies incoming
//! requests. Rules added first have priority: matching walks the list in
//! registration order and the first rule that matches wins.
//!
//! ## Rule variants
//!
//! - **Simple literal** — exact, case-sensitive path comparison.
//! - **Simple pattern** — a regular expression; named and positional
//!   captures are merged into the route parameters handed to the handler.
//! - **Predicate** — an arbitrary `Fn(&Request) -> bool` match function.
//! - **Structured (MVP)** — interprets the path as
//!   `/{presenter}?/{action}?{/extended…}` with defaults `home`/`default`,
//!   splitting a `name-digits` presenter segment into name and entity id.
//!
//! A structured rule classifies *every* path once reached, so a router
//! accepts at most one of them and only as its last rule. Both invariants
//! are enforced at registration time so a misconfigured router fails during
//! startup, never during traffic.

mod core;
#[cfg(test)]
mod tests;

pub use core::{HandlerFn, MatchFn, MvpParams, RouteMatch, RouteParams, Router};
