//! # Freesia Router
//!
//! Rule compiler and method-aware URL router with typed path parameters:
//! - Static rules (`/about`) looked up by exact string
//! - Placeholders (`/users/<name>`) using the default `[^/]+` filter
//! - Typed placeholders (`/users/<int:id>`, `/price/<float:amount>`)
//! - User filters registered under any name (`/files/<path:rest>`)
//!
//! ## Matching Model
//!
//! Every rule is compiled once into either a literal key (no placeholders) or
//! an anchored regex with one named group per placeholder. The [`Router`]
//! keeps static routes in an exact-path table and dynamic routes in per-method
//! lists scanned in registration order, then classifies every miss as
//! `NotFound` or `MethodNotAllowed` so the caller can answer 404 or 405.
//!
//! ## Example
//!
//! ```
//! use freesia_router::{FilterRegistry, Route, RouteOptions, Router, Value};
//!
//! let filters = FilterRegistry::new();
//! let mut router = Router::new();
//! router.add_route(Route::new(&filters, "/about", ["GET"], "about", RouteOptions::new()).unwrap());
//! router.add_route(
//!     Route::new(&filters, "/users/<int:id>", ["GET"], "user", RouteOptions::new().unchecked())
//!         .unwrap(),
//! );
//!
//! let hit = router.resolve("/users/123", "GET").unwrap();
//! assert_eq!(hit.endpoint(), "user");
//! assert_eq!(hit.params, vec![Value::Int(123)]);
//! ```

// ============================================================================
// Module Declarations
// ============================================================================

mod error;
mod filter;
pub mod route;
mod router;

pub use error::{ResolveError, RouteError};
pub use filter::{
    DecodeError, DecodeFn, EncodeFn, FilterRegistry, FilterSpec, UnknownFilter, Value,
    DEFAULT_PATTERN, FLOAT_PATTERN, INT_PATTERN,
};
pub use route::parser::{compile, BuildToken, CompiledRule};
pub use route::pattern::{tokenize, Token, DEFAULT_FILTER};
pub use route::{Params, Route, RouteOptions, RouteTarget};
pub use router::{Resolved, Router};

// ============================================================================
// Capabilities
// ============================================================================

/// Anything that can test a `(path, method)` pair and decode its parameters
pub trait RouteMatcher {
    /// `Ok(None)` is a miss; `Err` is a request-level failure such as a
    /// parameter that matched its pattern but could not be decoded.
    fn match_route(&self, path: &str, method: &str) -> Result<Option<Params>, ResolveError>;
}

/// A registry of routes that resolves requests
pub trait RouteTable {
    type Handler;

    fn add_route(&mut self, route: Route<Self::Handler>);

    fn resolve(
        &self,
        path: &str,
        method: &str,
    ) -> Result<Resolved<'_, Self::Handler>, ResolveError>;
}
