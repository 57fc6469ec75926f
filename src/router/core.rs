//! Route table and matching algorithm.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::application::App;
use crate::error::Error;
use crate::request::Request;

/// Handler invoked for simple and predicate routes. A `Some` return value
/// becomes the response body; `None` means the handler wrote to the sink
/// directly.
pub type HandlerFn =
    Arc<dyn Fn(&App, &mut Request, &RouteParams) -> Result<Option<Value>, Error> + Send + Sync>;

/// Match predicate for callback routes.
pub type MatchFn = Arc<dyn Fn(&Request) -> bool + Send + Sync>;

/// Parameters produced by a simple or predicate rule: regex captures, both
/// named and positional (`"0"` is the full match). Named captures override
/// positional ones of the same name.
pub type RouteParams = HashMap<String, String>;

/// Parameters parsed from the path by a structured (MVP) rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MvpParams {
    /// Namespace the presenter registry resolves against.
    pub namespace: String,
    /// First path segment; `home` when absent.
    pub presenter: String,
    /// Second path segment; `default` when absent.
    pub action: String,
    /// Numeric suffix split off a `name-digits` presenter segment.
    pub id: Option<String>,
    /// Everything past the action, kept with leading slashes.
    pub extended_path: String,
}

impl MvpParams {
    fn defaults(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            presenter: "home".to_string(),
            action: "default".to_string(),
            id: None,
            extended_path: String::new(),
        }
    }
}

/// Successful classification of a request.
pub enum RouteMatch {
    /// A structured rule matched; resolve a presenter from the registry.
    Mvp(MvpParams),
    /// A simple or predicate rule matched; invoke its handler.
    Handler {
        handler: HandlerFn,
        params: RouteParams,
    },
}

enum Rule {
    Literal { path: String, handler: HandlerFn },
    Pattern { regex: Regex, handler: HandlerFn },
    Predicate { matches: MatchFn, handler: HandlerFn },
    Mvp { namespace: String },
}

impl Rule {
    fn kind(&self) -> &'static str {
        match self {
            Rule::Literal { .. } => "literal",
            Rule::Pattern { .. } => "pattern",
            Rule::Predicate { .. } => "predicate",
            Rule::Mvp { .. } => "mvp",
        }
    }
}

// Path shape a structured rule matches: [/presenter][/action][/extended...].
static MVP_PATH: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^/(?P<presenter>[^/]+)?/?(?P<action>[^/]+)?(?P<extended_path>(?:/[^/]+)*)$")
        .expect("static route-shape regex compiles")
});

// presenter-42 -> presenter name + entity id.
static PRESENTER_ID: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^(?P<presenter>.*?)-(?P<id>\d+)$").expect("static presenter-id regex compiles")
});

/// Ordered route table. Matching tries rules in registration order and the
/// first match wins.
#[derive(Default)]
pub struct Router {
    rules: Vec<Rule>,
    mvp_handled: bool,
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, rule: Rule) -> Result<(), Error> {
        if matches!(rule, Rule::Mvp { .. }) {
            if self.mvp_handled {
                return Err(Error::configuration(
                    "an MVP rule was already added to this router",
                ));
            }
            self.mvp_handled = true;
        } else if self.mvp_handled {
            return Err(Error::configuration(
                "custom route rules must be added before the MVP rule",
            ));
        }

        info!(
            rule_kind = rule.kind(),
            total_rules = self.rules.len() + 1,
            "Route rule registered"
        );
        self.rules.push(rule);
        Ok(())
    }

    /// Add a literal path rule. Matching is exact and case-sensitive; no
    /// trailing-slash normalization is applied.
    pub fn add(
        &mut self,
        path: &str,
        handler: impl Fn(&App, &mut Request, &RouteParams) -> Result<Option<Value>, Error>
            + Send
            + Sync
            + 'static,
    ) -> Result<(), Error> {
        self.push(Rule::Literal {
            path: path.to_string(),
            handler: Arc::new(handler),
        })
    }

    /// Add a pattern rule. The expression is compiled here so a bad pattern
    /// fails at configuration time.
    pub fn add_pattern(
        &mut self,
        pattern: &str,
        handler: impl Fn(&App, &mut Request, &RouteParams) -> Result<Option<Value>, Error>
            + Send
            + Sync
            + 'static,
    ) -> Result<(), Error> {
        let regex = Regex::new(pattern).map_err(|e| {
            Error::configuration(format!("invalid route pattern {pattern}: {e}"))
        })?;
        self.push(Rule::Pattern {
            regex,
            handler: Arc::new(handler),
        })
    }

    /// Add a predicate rule matched by an arbitrary function of the request.
    pub fn add_callback(
        &mut self,
        matches: impl Fn(&Request) -> bool + Send + Sync + 'static,
        handler: impl Fn(&App, &mut Request, &RouteParams) -> Result<Option<Value>, Error>
            + Send
            + Sync
            + 'static,
    ) -> Result<(), Error> {
        self.push(Rule::Predicate {
            matches: Arc::new(matches),
            handler: Arc::new(handler),
        })
    }

    /// Add the structured (MVP) rule for a presenter namespace. Must be the
    /// last rule added, and only one may exist per router.
    pub fn add_mvp(&mut self, namespace: &str) -> Result<(), Error> {
        self.push(Rule::Mvp {
            namespace: namespace.to_string(),
        })
    }

    /// Classify a request against the rule list. `None` means no rule
    /// matched and the caller should fail with not-found.
    #[must_use]
    pub fn matches(&self, request: &Request) -> Option<RouteMatch> {
        let path = request.path();
        debug!(method = %request.method(), path = %path, "Route match attempt");

        for rule in &self.rules {
            match rule {
                Rule::Literal { path: literal, handler } => {
                    if path == literal {
                        info!(path = %path, rule_kind = "literal", "Route matched");
                        return Some(RouteMatch::Handler {
                            handler: Arc::clone(handler),
                            params: RouteParams::new(),
                        });
                    }
                }
                Rule::Pattern { regex, handler } => {
                    if let Some(captures) = regex.captures(path) {
                        let params = capture_params(regex, &captures);
                        info!(path = %path, rule_kind = "pattern", "Route matched");
                        return Some(RouteMatch::Handler {
                            handler: Arc::clone(handler),
                            params,
                        });
                    }
                }
                Rule::Predicate { matches, handler } => {
                    if matches(request) {
                        info!(path = %path, rule_kind = "predicate", "Route matched");
                        return Some(RouteMatch::Handler {
                            handler: Arc::clone(handler),
                            params: RouteParams::new(),
                        });
                    }
                }
                // Once reached, a structured rule classifies every path.
                Rule::Mvp { namespace } => {
                    if let Some(params) = parse_mvp_path(namespace, path) {
                        info!(
                            path = %path,
                            presenter = %params.presenter,
                            action = %params.action,
                            rule_kind = "mvp",
                            "Route matched"
                        );
                        return Some(RouteMatch::Mvp(params));
                    }
                }
            }
        }

        warn!(method = %request.method(), path = %path, "No route matched");
        None
    }
}

fn capture_params(regex: &Regex, captures: &regex::Captures<'_>) -> RouteParams {
    let mut params = RouteParams::new();
    for (index, capture) in captures.iter().enumerate() {
        if let Some(capture) = capture {
            params.insert(index.to_string(), capture.as_str().to_string());
        }
    }
    for name in regex.capture_names().flatten() {
        if let Some(capture) = captures.name(name) {
            params.insert(name.to_string(), capture.as_str().to_string());
        }
    }
    params
}

fn parse_mvp_path(namespace: &str, path: &str) -> Option<MvpParams> {
    let captures = MVP_PATH.captures(path)?;
    let mut params = MvpParams::defaults(namespace);

    if let Some(presenter) = captures.name("presenter").filter(|m| !m.as_str().is_empty()) {
        params.presenter = presenter.as_str().to_string();
    }
    if let Some(action) = captures.name("action").filter(|m| !m.as_str().is_empty()) {
        params.action = action.as_str().to_string();
    }
    if let Some(extended) = captures
        .name("extended_path")
        .filter(|m| !m.as_str().is_empty())
    {
        params.extended_path = extended.as_str().to_string();
    }

    let segment = params.presenter.clone();
    if let Some(split) = PRESENTER_ID.captures(&segment) {
        if let (Some(presenter), Some(id)) = (split.name("presenter"), split.name("id")) {
            params.presenter = presenter.as_str().to_string();
            params.id = Some(id.as_str().to_string());
        }
    }

    Some(params)
}
