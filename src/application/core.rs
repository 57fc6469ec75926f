//! Local dispatch loop and error-to-response translation.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::OnceCell;
use serde_json::json;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::Error;
use crate::presenter::{Presenter, PresenterContext, PresenterRegistry};
use crate::request::Request;
use crate::router::{HandlerFn, MvpParams, RouteMatch, RouteParams, Router};

/// Default recursion ceiling — the deadlock guard for dispatch chains that
/// recurse through local or remote applications.
pub const MAX_NESTING_LEVEL: u32 = 10;

/// Environment mode. Development responses carry a debug block; production
/// responses never expose internals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Environment::Development),
            "production" => Ok(Environment::Production),
            other => Err(Error::configuration(format!(
                "unsupported environment {other}"
            ))),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Environment::Development => "development",
            Environment::Production => "production",
        })
    }
}

/// The dispatch contract shared by local and remote applications.
///
/// Local implementations translate every failure into the response sink
/// and return `Ok`; remote implementations propagate remote-originated
/// failures so the proxying side can apply its own translation.
pub trait Application: Send + Sync {
    fn execute(&self, request: &mut Request) -> Result<(), Error>;
}

/// One-time initialization hook, run lazily on the first dispatch so
/// failures (a database handle refusing to open, say) surface through the
/// normal error path instead of at construction.
pub trait AppDelegate: Send + Sync {
    fn init(&self, _config: &Config) -> Result<(), Error> {
        Ok(())
    }
}

struct NoopDelegate;

impl AppDelegate for NoopDelegate {}

/// A locally executing application: router, presenter registry, readonly
/// configuration, and the one-shot init guard.
pub struct App {
    config: Config,
    environment: Environment,
    router: Option<Router>,
    presenters: PresenterRegistry,
    delegate: Box<dyn AppDelegate>,
    // Latches only on successful init; a failed init is retried by the
    // next request.
    initialized: OnceCell<()>,
    max_nesting: u32,
}

impl App {
    /// Build an application with no init hook.
    pub fn new(config: Config) -> Result<Self, Error> {
        Self::with_delegate(config, NoopDelegate)
    }

    /// Build an application whose delegate runs once before the first
    /// dispatch.
    pub fn with_delegate(
        config: Config,
        delegate: impl AppDelegate + 'static,
    ) -> Result<Self, Error> {
        let environment = match config.environment() {
            Some(raw) => raw.parse()?,
            None => Environment::Production,
        };
        let max_nesting = config.max_nesting_level().unwrap_or(MAX_NESTING_LEVEL);

        Ok(Self {
            config,
            environment,
            router: None,
            presenters: PresenterRegistry::new(),
            delegate: Box::new(delegate),
            initialized: OnceCell::new(),
            max_nesting,
        })
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Override the environment mode; configuration-time only.
    pub fn set_environment(&mut self, environment: Environment) {
        self.environment = environment;
    }

    /// Attach the route table; configuration-time only.
    pub fn set_router(&mut self, router: Router) {
        self.router = Some(router);
    }

    #[must_use]
    pub fn router(&self) -> Option<&Router> {
        self.router.as_ref()
    }

    /// Register a presenter for structured routes.
    pub fn register_presenter(
        &mut self,
        namespace: &str,
        name: &str,
        factory: impl Fn() -> Box<dyn Presenter> + Send + Sync + 'static,
    ) {
        self.presenters.register(namespace, name, factory);
    }

    #[must_use]
    pub fn presenters(&self) -> &PresenterRegistry {
        &self.presenters
    }

    fn dispatch(&self, request: &mut Request) -> Result<(), Error> {
        // Externally originated requests must prove they hold the shared
        // secret; internally built ones skip verification.
        if let Some(secret) = self.config.client_secret() {
            request.verify_signature(secret)?;
        }
        if let Some(base) = self.config.base_path() {
            if !request.is_internal() {
                request.trim_base_path(base)?;
            }
        }

        self.initialized.get_or_try_init(|| {
            info!("Application init");
            self.delegate.init(&self.config)
        })?;

        if request.nesting_level() > self.max_nesting {
            return Err(Error::NestingTooDeep(self.max_nesting));
        }

        let router = self
            .router
            .as_ref()
            .ok_or_else(|| Error::configuration("router is missing"))?;

        match router.matches(request) {
            Some(RouteMatch::Mvp(params)) => self.execute_presenter(request, params),
            Some(RouteMatch::Handler { handler, params }) => {
                self.execute_handler(request, &handler, &params)
            }
            None => Err(Error::not_found(format!(
                "unable to route: {}",
                request.path()
            ))),
        }
    }

    fn execute_presenter(&self, request: &mut Request, params: MvpParams) -> Result<(), Error> {
        let factory = self
            .presenters
            .resolve(&params.namespace, &params.presenter)
            .ok_or_else(|| {
                Error::not_found(format!(
                    "the alias you requested does not exist: {}",
                    request.path()
                ))
            })?;
        let mut presenter = factory();

        let mut params = params;
        if presenter.single_action() {
            // The action segment was never an action; give it back to the
            // extended path and run the default action.
            params.extended_path = format!("/{}{}", params.action, params.extended_path);
            params.action = "default".to_string();
        }

        let action = params.action.clone();
        if !presenter.has_action(&action) {
            return Err(crate::presenter::unknown_action(&action));
        }

        let mut ctx = PresenterContext {
            app: self,
            request,
            route: &params,
        };
        presenter.before(&mut ctx)?;
        let value = presenter.run_action(&action, &mut ctx)?;
        presenter.after(&mut ctx)?;

        if let Some(value) = value {
            request.response.set(value);
        }
        Ok(())
    }

    fn execute_handler(
        &self,
        request: &mut Request,
        handler: &HandlerFn,
        params: &RouteParams,
    ) -> Result<(), Error> {
        if let Some(value) = handler(self, request, params)? {
            request.response.set(value);
        }
        Ok(())
    }

    /// Translate a dispatch failure into the structured error envelope.
    ///
    /// Discards partial output, applies the status code where the sink
    /// supports one, and attaches `{"message", "type"}` — plus a `debug`
    /// sub-object in Development mode. Never fails.
    pub fn handle_error(&self, error: &Error, request: &mut Request) {
        if error.is_fatal() {
            error!(
                kind = error.kind(),
                method = %request.method(),
                path = %request.path(),
                %error,
                "Dispatch failed"
            );
        } else {
            warn!(
                kind = error.kind(),
                method = %request.method(),
                path = %request.path(),
                %error,
                "Dispatch failed"
            );
        }

        let mut block = json!({
            "message": error.to_string(),
            "type": error.kind(),
        });

        if self.environment == Environment::Development {
            let mut chain = Vec::new();
            let mut source = std::error::Error::source(error);
            while let Some(cause) = source {
                chain.push(cause.to_string());
                source = cause.source();
            }
            block["debug"] = json!({
                "code": error.status_code().as_u16(),
                "chain": chain,
                "request": {
                    "method": request.method().as_str(),
                    "path": request.path(),
                    "params": request.params.clone(),
                },
            });
            if let Some(parent) = request.parent() {
                if let Ok(parent) = serde_json::to_value(parent) {
                    block["debug"]["request"]["parent"] = parent;
                }
            }
        }

        request.response.clear();
        request.response.set_status(error.status_code());
        request.response.insert("error", block);
    }
}

impl Application for App {
    /// The externally visible entry point. Never re-raises: every failure
    /// is caught here and written into the response sink.
    fn execute(&self, request: &mut Request) -> Result<(), Error> {
        if let Err(e) = self.dispatch(request) {
            self.handle_error(&e, request);
        }
        Ok(())
    }
}
