//! # Freesia
//!
//! A small async web application layer over [`freesia_router`]:
//! - Typed handlers: `async fn(RequestContext, i64, String) -> impl IntoResponse`
//! - Route groups with URL prefixes and namespaced endpoints
//! - Method views dispatching one rule to per-verb handlers
//! - Dispatch to 404 / 405 (with `Allow`) / 400 responses
//!
//! ## Example
//!
//! ```no_run
//! use freesia::{App, Config, RequestContext};
//!
//! async fn hello(_ctx: RequestContext, name: String) -> String {
//!     format!("Hello, {}!", name)
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load_default()?;
//!     let mut app = App::with_config(&config.routing);
//!     app.get("/hello/<name>", hello)?;
//!     app.serve(&config.server).await
//! }
//! ```

// ============================================================================
// Module Declarations
// ============================================================================

pub mod app;
pub mod config;
pub mod dispatch;
pub mod group;
pub mod handler;
pub mod logging;
pub mod request_context;
pub mod view;

// ============================================================================
// Public API Exports
// ============================================================================

pub use app::App;
pub use config::{Config, LoggingConfig, RoutingConfig, ServerConfig};
pub use dispatch::error_response;
pub use group::Group;
pub use handler::{BoxedHandler, FromValue, FromValueError, Handler};
pub use request_context::{QueryParams, RequestContext};
pub use view::{MethodView, Verb};

pub use freesia_router::{
    DecodeError, FilterRegistry, FilterSpec, ResolveError, RouteError, RouteOptions, Value,
};
