//! Route table and the resolve algorithm.
//!
//! Two indexes over one owned route list:
//!
//! - `static_index`: exact path → routes registered under that literal rule
//! - `dynamic_index`: method → dynamic routes declaring that method
//!
//! Registration order is preserved everywhere and is the match priority.
//! The table is built during startup and is read-only afterwards, so
//! `resolve` takes `&self` and needs no locking.

use std::collections::{BTreeSet, HashMap};

use crate::error::ResolveError;
use crate::route::{Params, Route};
use crate::RouteTable;

/// Successful resolution: the route that matched and its decoded parameters
#[derive(Debug)]
pub struct Resolved<'a, H> {
    pub route: &'a Route<H>,
    pub params: Params,
}

impl<'a, H> Resolved<'a, H> {
    pub fn handler(&self) -> &'a H {
        self.route.handler()
    }

    pub fn endpoint(&self) -> &'a str {
        self.route.endpoint()
    }
}

/// Method-aware router over compiled [`Route`]s
///
/// # Examples
///
/// ```
/// use freesia_router::{FilterRegistry, ResolveError, Route, RouteOptions, Router, Value};
///
/// let registry = FilterRegistry::new();
/// let mut router = Router::new();
/// router.add_route(Route::new(&registry, "/test", ["GET"], "h1", RouteOptions::new()).unwrap());
/// router.add_route(
///     Route::new(&registry, "/test/<int:age>", ["GET"], "h2", RouteOptions::new().unchecked()).unwrap(),
/// );
///
/// let hit = router.resolve("/test/5", "GET").unwrap();
/// assert_eq!(*hit.handler(), "h2");
/// assert_eq!(hit.params, vec![Value::Int(5)]);
///
/// assert!(matches!(router.resolve("/test", "POST"), Err(ResolveError::MethodNotAllowed { .. })));
/// assert!(matches!(router.resolve("/nope", "GET"), Err(ResolveError::NotFound { .. })));
/// ```
pub struct Router<H> {
    routes: Vec<Route<H>>,
    static_index: HashMap<String, Vec<usize>>,
    dynamic_index: HashMap<String, Vec<usize>>,
}

impl<H> Router<H> {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            static_index: HashMap::new(),
            dynamic_index: HashMap::new(),
        }
    }

    /// Appends a route; no dedup, no sorting
    pub fn add_route(&mut self, route: Route<H>) {
        let idx = self.routes.len();

        if route.is_static() {
            self.static_index
                .entry(route.pattern().to_string())
                .or_default()
                .push(idx);
        } else {
            for method in route.methods() {
                self.dynamic_index
                    .entry(method.clone())
                    .or_default()
                    .push(idx);
            }
        }

        tracing::debug!(
            rule = %route.rule(),
            endpoint = %route.endpoint(),
            index = idx,
            "route added"
        );
        self.routes.push(route);
    }

    /// Builder form of [`add_route`](Self::add_route)
    pub fn with_route(mut self, route: Route<H>) -> Self {
        self.add_route(route);
        self
    }

    /// Resolves a request to a route and its decoded parameters
    ///
    /// 1. An exact static key wins outright. If none of its routes allows
    ///    `method` the answer is `MethodNotAllowed`; dynamic routes are never
    ///    consulted for that path.
    /// 2. A method no dynamic route declares is `NotFound`.
    /// 3. Dynamic routes for `method` are tried in registration order; the
    ///    first match wins and a decode failure is returned as `BadRequest`.
    /// 4. Otherwise every dynamic route is tested path-only; any hit turns the
    ///    answer into `MethodNotAllowed` with the union of their methods.
    pub fn resolve(&self, path: &str, method: &str) -> Result<Resolved<'_, H>, ResolveError> {
        if let Some(indices) = self.static_index.get(path) {
            let candidates = indices.iter().map(|&i| &self.routes[i]);

            if let Some(route) = candidates.clone().find(|r| r.allows(method)) {
                return Ok(Resolved {
                    route,
                    params: Vec::new(),
                });
            }

            let allowed = union_methods(candidates);
            tracing::trace!(path, method, ?allowed, "static path, method not allowed");
            return Err(ResolveError::MethodNotAllowed {
                path: path.to_string(),
                method: method.to_string(),
                allowed,
            });
        }

        let Some(indices) = self.dynamic_index.get(method) else {
            return Err(self.not_found(path));
        };

        for &i in indices {
            let route = &self.routes[i];
            if let Some(params) = route.matches(path, method)? {
                return Ok(Resolved { route, params });
            }
        }

        let allowed = union_methods(self.dynamic_routes().filter(|r| r.matches_path(path)));
        if allowed.is_empty() {
            return Err(self.not_found(path));
        }

        tracing::trace!(path, method, ?allowed, "dynamic path, method not allowed");
        Err(ResolveError::MethodNotAllowed {
            path: path.to_string(),
            method: method.to_string(),
            allowed,
        })
    }

    /// All routes in registration order
    pub fn routes(&self) -> &[Route<H>] {
        &self.routes
    }

    /// Routes stored under an exact static key
    pub fn static_routes(&self, path: &str) -> impl Iterator<Item = &Route<H>> {
        self.static_index
            .get(path)
            .into_iter()
            .flatten()
            .map(|&i| &self.routes[i])
    }

    /// Dynamic routes that declare `method`, in match order
    pub fn dynamic_routes_for(&self, method: &str) -> impl Iterator<Item = &Route<H>> {
        self.dynamic_index
            .get(method)
            .into_iter()
            .flatten()
            .map(|&i| &self.routes[i])
    }

    /// Number of distinct static keys
    pub fn static_len(&self) -> usize {
        self.static_index.len()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    fn dynamic_routes(&self) -> impl Iterator<Item = &Route<H>> {
        self.routes.iter().filter(|r| !r.is_static())
    }

    fn not_found(&self, path: &str) -> ResolveError {
        ResolveError::NotFound {
            path: path.to_string(),
        }
    }
}

impl<H> Default for Router<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> std::fmt::Debug for Router<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}

impl<H> RouteTable for Router<H> {
    type Handler = H;

    fn add_route(&mut self, route: Route<H>) {
        Router::add_route(self, route);
    }

    fn resolve(&self, path: &str, method: &str) -> Result<Resolved<'_, H>, ResolveError> {
        Router::resolve(self, path, method)
    }
}

fn union_methods<'a, H: 'a>(routes: impl Iterator<Item = &'a Route<H>>) -> BTreeSet<String> {
    routes.flat_map(|r| r.methods().iter().cloned()).collect()
}
