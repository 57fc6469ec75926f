//! Presenter contract and registry for structured (MVP) routes.
//!
//! A structured route names a presenter and an action; the application
//! resolves the presenter through an explicit registry populated at startup
//! — `(namespace, name)` to factory — so an unknown presenter is a plain
//! lookup miss rather than a runtime type-resolution failure.
//!
//! Lifecycle per dispatch: the `has_action()` gate, then `before()`, the
//! named action via [`Presenter::run_action`], and `after()`. A `Some`
//! value returned from the action becomes the response body; `None` means
//! the presenter wrote to the sink directly.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::application::App;
use crate::error::Error;
use crate::request::{Method, Request};
use crate::router::MvpParams;

/// Borrowed view of the dispatch state handed to each lifecycle method.
pub struct PresenterContext<'a> {
    pub app: &'a App,
    pub request: &'a mut Request,
    pub route: &'a MvpParams,
}

impl PresenterContext<'_> {
    /// Fail unless the request was made with the given verb.
    pub fn require_method(&self, method: Method) -> Result<(), Error> {
        if self.request.method() != method {
            return Err(Error::Handler(anyhow!(
                "another request method is required: {method}"
            )));
        }
        Ok(())
    }

    /// Fail unless every named parameter is present and non-empty.
    pub fn require_params(&self, names: &[&str]) -> Result<(), Error> {
        for name in names {
            let missing = match self.request.params.get(*name) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.is_empty(),
                Some(_) => false,
            };
            if missing {
                return Err(Error::Handler(anyhow!(
                    "additional parameter is missing: {name}"
                )));
            }
        }
        Ok(())
    }
}

/// Handler for a structured route.
///
/// `run_action` dispatches on the action name parsed from the path and
/// returns [`Error::NotFound`] for names it does not implement — the
/// [`unknown_action`] helper builds that error. Presenters that override
/// [`has_action`](Presenter::has_action) get the same rejection before
/// `before()` runs, so an unknown action causes no side effects.
pub trait Presenter: Send {
    /// When `true`, the action segment is treated as part of the extended
    /// path and every request runs the default action.
    fn single_action(&self) -> bool {
        false
    }

    /// Whether the presenter implements the named action. Checked ahead of
    /// `before()`; the permissive default defers rejection to `run_action`.
    fn has_action(&self, _action: &str) -> bool {
        true
    }

    fn before(&mut self, _ctx: &mut PresenterContext<'_>) -> Result<(), Error> {
        Ok(())
    }

    /// Run the named action. The returned value, if any, becomes the
    /// response body.
    fn run_action(
        &mut self,
        action: &str,
        ctx: &mut PresenterContext<'_>,
    ) -> Result<Option<Value>, Error>;

    fn after(&mut self, _ctx: &mut PresenterContext<'_>) -> Result<(), Error> {
        Ok(())
    }
}

/// Not-found error for an action name a presenter does not implement.
#[must_use]
pub fn unknown_action(action: &str) -> Error {
    Error::not_found(format!("unknown action: {action}"))
}

/// Factory producing a fresh presenter per dispatch.
pub type PresenterFactory = Arc<dyn Fn() -> Box<dyn Presenter> + Send + Sync>;

// Route segments that can name a presenter.
static PRESENTER_NAME: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[A-Za-z0-9_]+$").expect("static presenter-name regex compiles")
});

/// Startup-populated map from `(namespace, presenter-name)` to factory.
#[derive(Default)]
pub struct PresenterRegistry {
    factories: HashMap<(String, String), PresenterFactory>,
}

impl PresenterRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a presenter under a namespace. Replaces any previous
    /// registration of the same name.
    pub fn register(
        &mut self,
        namespace: &str,
        name: &str,
        factory: impl Fn() -> Box<dyn Presenter> + Send + Sync + 'static,
    ) {
        self.factories
            .insert((namespace.to_string(), name.to_string()), Arc::new(factory));
    }

    /// Look up a presenter factory. Segments that cannot name a presenter
    /// (anything outside `[A-Za-z0-9_]+`) never resolve.
    #[must_use]
    pub fn resolve(&self, namespace: &str, name: &str) -> Option<&PresenterFactory> {
        if !PRESENTER_NAME.is_match(name) {
            return None;
        }
        self.factories
            .get(&(namespace.to_string(), name.to_string()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Null;

    impl Presenter for Null {
        fn run_action(
            &mut self,
            action: &str,
            _ctx: &mut PresenterContext<'_>,
        ) -> Result<Option<Value>, Error> {
            Err(unknown_action(action))
        }
    }

    #[test]
    fn registry_resolves_by_namespace_and_name() {
        let mut registry = PresenterRegistry::new();
        registry.register("app", "user", || Box::new(Null));

        assert!(registry.resolve("app", "user").is_some());
        assert!(registry.resolve("app", "other").is_none());
        assert!(registry.resolve("admin", "user").is_none());
    }

    #[test]
    fn invalid_segments_never_resolve() {
        let mut registry = PresenterRegistry::new();
        registry.register("app", "..", || Box::new(Null));

        assert!(registry.resolve("app", "..").is_none());
        assert!(registry.resolve("app", "user profile").is_none());
    }
}
