// File: src/view.rs
// Purpose: Method views, one route whose handler is picked by HTTP verb

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use freesia_router::{RouteError, RouteTarget};

use crate::handler::{BoxedHandler, Handler};

/// HTTP verbs a view can answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Verb {
    Get,
    Post,
    Head,
    Options,
    Delete,
    Put,
    Trace,
    Patch,
}

impl Verb {
    pub const ALL: [Verb; 8] = [
        Verb::Get,
        Verb::Post,
        Verb::Head,
        Verb::Options,
        Verb::Delete,
        Verb::Put,
        Verb::Trace,
        Verb::Patch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Head => "HEAD",
            Verb::Options => "OPTIONS",
            Verb::Delete => "DELETE",
            Verb::Put => "PUT",
            Verb::Trace => "TRACE",
            Verb::Patch => "PATCH",
        }
    }

    /// Case-insensitive lookup
    pub fn from_method(method: &str) -> Option<Verb> {
        Verb::ALL
            .into_iter()
            .find(|verb| verb.as_str().eq_ignore_ascii_case(method))
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A verb-keyed handler table registered as a single route
///
/// ```
/// use freesia::{MethodView, RequestContext};
///
/// async fn show(_ctx: RequestContext, name: String) -> String { name }
/// async fn rename(_ctx: RequestContext, name: String) -> String { format!("renamed {}", name) }
///
/// let view = MethodView::new("Person").get(show).put(rename);
/// let methods: Vec<_> = view.methods().into_iter().collect();
/// assert_eq!(methods, vec!["GET", "PUT"]);
/// ```
#[derive(Clone)]
pub struct MethodView {
    name: String,
    handlers: BTreeMap<Verb, BoxedHandler>,
}

impl MethodView {
    /// The name becomes the route's default endpoint
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handlers: BTreeMap::new(),
        }
    }

    /// Attach `handler` to `verb`, replacing any earlier one
    pub fn on<H, Args>(mut self, verb: Verb, handler: H) -> Self
    where
        H: Handler<Args>,
        Args: 'static,
    {
        self.handlers.insert(verb, BoxedHandler::new(handler));
        self
    }

    pub fn get<H: Handler<Args>, Args: 'static>(self, handler: H) -> Self {
        self.on(Verb::Get, handler)
    }

    pub fn post<H: Handler<Args>, Args: 'static>(self, handler: H) -> Self {
        self.on(Verb::Post, handler)
    }

    pub fn head<H: Handler<Args>, Args: 'static>(self, handler: H) -> Self {
        self.on(Verb::Head, handler)
    }

    pub fn options<H: Handler<Args>, Args: 'static>(self, handler: H) -> Self {
        self.on(Verb::Options, handler)
    }

    pub fn delete<H: Handler<Args>, Args: 'static>(self, handler: H) -> Self {
        self.on(Verb::Delete, handler)
    }

    pub fn put<H: Handler<Args>, Args: 'static>(self, handler: H) -> Self {
        self.on(Verb::Put, handler)
    }

    pub fn trace<H: Handler<Args>, Args: 'static>(self, handler: H) -> Self {
        self.on(Verb::Trace, handler)
    }

    pub fn patch<H: Handler<Args>, Args: 'static>(self, handler: H) -> Self {
        self.on(Verb::Patch, handler)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Verbs with an attached handler, scanned over [`Verb::ALL`]
    pub fn methods(&self) -> BTreeSet<String> {
        Verb::ALL
            .into_iter()
            .filter(|verb| self.handlers.contains_key(verb))
            .map(|verb| verb.as_str().to_string())
            .collect()
    }

    /// Collapses the table into one handler that dispatches on the request verb
    ///
    /// All attached handlers must take the same number of path parameters.
    /// Verbs without a handler answer 405 with the view's `Allow` set.
    pub(crate) fn into_handler(self, rule: &str) -> Result<BoxedHandler, RouteError> {
        let mut arities = self.handlers.values().map(|h| (h.name().to_string(), h.arity()));
        let arity = match arities.next() {
            Some((_, first)) => {
                if let Some((endpoint, found)) = arities.find(|(_, a)| *a != first) {
                    return Err(RouteError::ArityMismatch {
                        rule: rule.to_string(),
                        endpoint: format!("{}.{}", self.name, endpoint),
                        expected: first,
                        found,
                    });
                }
                first
            }
            None => 0,
        };

        let allow = self
            .methods()
            .into_iter()
            .collect::<Vec<_>>()
            .join(", ");
        let handlers = Arc::new(self.handlers);

        Ok(BoxedHandler::from_fn(self.name, arity, move |ctx, params| {
            let Some(handler) = Verb::from_method(ctx.method.as_str()).and_then(|v| handlers.get(&v)) else {
                tracing::warn!(method = %ctx.method, path = %ctx.path, "view has no handler for method");
                let allow = allow.clone();
                return Box::pin(async move {
                    (
                        StatusCode::METHOD_NOT_ALLOWED,
                        [(header::ALLOW, allow)],
                        "Method Not Allowed",
                    )
                        .into_response()
                });
            };
            handler.call(ctx, params)
        }))
    }
}

impl fmt::Debug for MethodView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodView")
            .field("name", &self.name)
            .field("methods", &self.methods())
            .finish()
    }
}
