// File: src/app.rs
// Purpose: Application object owning filters, routes and groups

use std::sync::Arc;

use anyhow::{Context, Result};
use freesia_router::{FilterRegistry, FilterSpec, Route, RouteError, RouteOptions, RouteTarget, Router};

use crate::config::{RoutingConfig, ServerConfig};
use crate::dispatch::{dispatch, SharedRouter};
use crate::group::{Deferred, Group};
use crate::handler::{BoxedHandler, Handler};
use crate::view::MethodView;

/// A freesia application under construction
///
/// Registration methods take `&mut self`; [`into_router`](Self::into_router)
/// and [`serve`](Self::serve) consume the app, so the route table cannot
/// change once requests are being answered.
///
/// ```
/// use freesia::{App, RequestContext};
///
/// async fn hello(_ctx: RequestContext, name: String) -> String {
///     format!("Hello, {}!", name)
/// }
///
/// let mut app = App::new();
/// app.get("/hello/<name>", hello).unwrap();
///
/// assert_eq!(app.rules()[0].endpoint(), "hello");
/// let _service = app.into_router();
/// ```
pub struct App {
    filters: FilterRegistry,
    router: Router<BoxedHandler>,
    groups: Vec<String>,
    checking_param: bool,
}

impl App {
    pub fn new() -> Self {
        Self::with_config(&RoutingConfig::default())
    }

    pub fn with_config(config: &RoutingConfig) -> Self {
        Self {
            filters: FilterRegistry::new(),
            router: Router::new(),
            groups: Vec::new(),
            checking_param: config.checking_param,
        }
    }

    // ========================================================================
    // Filters
    // ========================================================================

    /// Registers (or replaces) a URL filter
    ///
    /// Affects rules added afterwards only.
    pub fn set_filter(&mut self, name: impl Into<String>, spec: FilterSpec) -> &mut Self {
        self.filters.register(name, spec);
        self
    }

    pub fn filters(&self) -> &FilterRegistry {
        &self.filters
    }

    // ========================================================================
    // Routes
    // ========================================================================

    /// Options applied by the verb shorthands
    pub fn default_options(&self) -> RouteOptions {
        RouteOptions::new().with_param_check(self.checking_param)
    }

    pub fn add_route<H, Args, I, S>(
        &mut self,
        rule: &str,
        methods: I,
        handler: H,
        options: RouteOptions,
    ) -> Result<&mut Self, RouteError>
    where
        H: Handler<Args>,
        Args: 'static,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.add_boxed(rule, methods, BoxedHandler::new(handler), options)
    }

    pub fn get<H: Handler<Args>, Args: 'static>(
        &mut self,
        rule: &str,
        handler: H,
    ) -> Result<&mut Self, RouteError> {
        self.add_route(rule, ["GET"], handler, self.default_options())
    }

    pub fn post<H: Handler<Args>, Args: 'static>(
        &mut self,
        rule: &str,
        handler: H,
    ) -> Result<&mut Self, RouteError> {
        self.add_route(rule, ["POST"], handler, self.default_options())
    }

    pub fn put<H: Handler<Args>, Args: 'static>(
        &mut self,
        rule: &str,
        handler: H,
    ) -> Result<&mut Self, RouteError> {
        self.add_route(rule, ["PUT"], handler, self.default_options())
    }

    pub fn delete<H: Handler<Args>, Args: 'static>(
        &mut self,
        rule: &str,
        handler: H,
    ) -> Result<&mut Self, RouteError> {
        self.add_route(rule, ["DELETE"], handler, self.default_options())
    }

    pub fn patch<H: Handler<Args>, Args: 'static>(
        &mut self,
        rule: &str,
        handler: H,
    ) -> Result<&mut Self, RouteError> {
        self.add_route(rule, ["PATCH"], handler, self.default_options())
    }

    /// Registers a method view; its verbs become the route's method set
    pub fn add_view(&mut self, rule: &str, view: MethodView) -> Result<&mut Self, RouteError> {
        let options = self.default_options();
        self.add_view_with(rule, view, options)
    }

    pub fn add_view_with(
        &mut self,
        rule: &str,
        view: MethodView,
        options: RouteOptions,
    ) -> Result<&mut Self, RouteError> {
        let methods = view.methods();
        let handler = view.into_handler(rule)?;
        self.add_boxed(rule, methods, handler, options)
    }

    fn add_boxed<I, S>(
        &mut self,
        rule: &str,
        methods: I,
        handler: BoxedHandler,
        options: RouteOptions,
    ) -> Result<&mut Self, RouteError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let route = Route::new(&self.filters, rule, methods, handler, options)?;
        self.router.add_route(route);
        Ok(self)
    }

    // ========================================================================
    // Groups
    // ========================================================================

    /// Replays a group's recorded registrations under its prefix and namespace
    pub fn register_group(&mut self, mut group: Group) -> Result<&mut Self, RouteError> {
        for deferred in group.take_deferred() {
            match deferred {
                Deferred::Filter { name, spec } => {
                    self.set_filter(name, spec);
                }
                Deferred::Route {
                    rule,
                    methods,
                    handler,
                    options,
                } => {
                    let options = self.group_options(&group, options, handler.name());
                    self.add_boxed(&group.prefixed(&rule), methods, handler, options)?;
                }
                Deferred::View {
                    rule,
                    view,
                    options,
                } => {
                    let options = self.group_options(&group, options, view.name());
                    self.add_view_with(&group.prefixed(&rule), view, options)?;
                }
            }
        }

        tracing::debug!(group = %group.name(), prefix = %group.url_prefix(), "group registered");
        self.groups.push(group.name().to_string());
        Ok(self)
    }

    /// Recorded options (or the app defaults) with a `"{group}.{endpoint}"` endpoint
    fn group_options(
        &self,
        group: &Group,
        options: Option<RouteOptions>,
        default_endpoint: &str,
    ) -> RouteOptions {
        let options = options.unwrap_or_else(|| self.default_options());
        let endpoint = group.namespaced(options.endpoint.as_deref().unwrap_or(default_endpoint));
        options.with_endpoint(endpoint)
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Every registered route, in registration order
    pub fn rules(&self) -> &[Route<BoxedHandler>] {
        self.router.routes()
    }

    pub fn router(&self) -> &Router<BoxedHandler> {
        &self.router
    }

    // ========================================================================
    // Serving
    // ========================================================================

    /// Seals the route table into an axum service
    pub fn into_router(self) -> axum::Router {
        tracing::info!(
            routes = self.router.len(),
            static_paths = self.router.static_len(),
            groups = self.groups.len(),
            "route table sealed"
        );
        let shared: SharedRouter = Arc::new(self.router);
        axum::Router::new().fallback(dispatch).with_state(shared)
    }

    /// Binds `host:port` and serves until the process is stopped
    pub async fn serve(self, config: &ServerConfig) -> Result<()> {
        let addr = config.addr();
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;

        tracing::info!("Serving on http://{}/", addr);

        axum::serve(listener, self.into_router())
            .await
            .context("Server error")?;
        Ok(())
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("filters", &self.filters.names())
            .field("routes", &self.router.len())
            .field("groups", &self.groups)
            .finish()
    }
}
