/// Route module: compiled, immutable routes
///
/// A [`Route`] is built once at registration time. Construction runs the rule
/// compiler, validates the method set and (optionally) checks the handler's
/// parameter count, so every inconsistency surfaces before serving starts.

pub mod parser;
pub mod pattern;

use std::collections::BTreeSet;
use std::fmt;

use regex::Regex;

use crate::error::{ResolveError, RouteError};
use crate::filter::{DecodeFn, FilterRegistry, Value};
use crate::RouteMatcher;

pub use parser::{compile, BuildToken, CompiledRule};
pub use pattern::{tokenize, Token};

/// Decoded parameters in rule order
pub type Params = Vec<Value>;

/// What the router needs to know about a handler
///
/// `arity` counts the positional parameters after the leading request
/// argument.
pub trait RouteTarget {
    /// Default endpoint name
    fn name(&self) -> &str;

    fn arity(&self) -> usize;
}

impl RouteTarget for &str {
    fn name(&self) -> &str {
        self
    }

    fn arity(&self) -> usize {
        0
    }
}

/// Per-registration knobs
#[derive(Debug, Clone)]
pub struct RouteOptions {
    /// Overrides the handler's name as endpoint
    pub endpoint: Option<String>,
    /// Compare placeholder count with the handler's arity (default: true)
    pub checking_param: bool,
}

impl RouteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_param_check(mut self, checking_param: bool) -> Self {
        self.checking_param = checking_param;
        self
    }

    /// Shorthand for `with_param_check(false)`
    pub fn unchecked(self) -> Self {
        self.with_param_check(false)
    }
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self {
            endpoint: None,
            checking_param: true,
        }
    }
}

/// A compiled route
///
/// # Examples
///
/// ```
/// use freesia_router::{FilterRegistry, Route, RouteOptions, RouteTarget, Value};
///
/// struct ShowUser;
/// impl RouteTarget for ShowUser {
///     fn name(&self) -> &str { "show_user" }
///     fn arity(&self) -> usize { 1 }
/// }
///
/// let registry = FilterRegistry::new();
/// let route = Route::new(&registry, "/users/<int:id>", ["GET"], ShowUser, RouteOptions::new()).unwrap();
///
/// assert_eq!(route.endpoint(), "show_user");
/// assert_eq!(route.matches("/users/7", "GET").unwrap(), Some(vec![Value::Int(7)]));
/// assert_eq!(route.matches("/users/7", "POST").unwrap(), None);
/// ```
pub struct Route<H> {
    rule: String,
    methods: BTreeSet<String>,
    handler: H,
    endpoint: String,
    pattern: String,
    regex: Option<Regex>,
    decoders: Vec<(String, DecodeFn)>,
    builder: Vec<BuildToken>,
    is_static: bool,
}

impl<H: RouteTarget> Route<H> {
    /// Compiles `rule` and validates it against `methods` and `handler`
    ///
    /// `methods` takes any collection of verb strings. A bare `&str` is not a
    /// collection, so `"GET"` must be written `["GET"]`.
    ///
    /// # Errors
    ///
    /// - [`RouteError::InvalidMethods`] for an empty set or a non-verb entry
    /// - [`RouteError::UnknownFilter`] / [`RouteError::DuplicateParam`] from the compiler
    /// - [`RouteError::ArityMismatch`] when checking is on and counts differ
    pub fn new<I, S>(
        registry: &FilterRegistry,
        rule: impl Into<String>,
        methods: I,
        handler: H,
        options: RouteOptions,
    ) -> Result<Self, RouteError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rule = rule.into();
        let methods = normalize_methods(&rule, methods)?;
        let endpoint = options
            .endpoint
            .unwrap_or_else(|| handler.name().to_string());

        let compiled = compile(&rule, registry)?;

        if options.checking_param && compiled.param_count() != handler.arity() {
            return Err(RouteError::ArityMismatch {
                rule,
                endpoint,
                expected: compiled.param_count(),
                found: handler.arity(),
            });
        }

        let regex = if compiled.is_static {
            None
        } else {
            let anchored = format!("^(?:{})$", compiled.pattern);
            let regex = Regex::new(&anchored).map_err(|source| RouteError::InvalidPattern {
                rule: rule.clone(),
                source,
            })?;
            Some(regex)
        };

        tracing::debug!(
            rule = %rule,
            endpoint = %endpoint,
            methods = ?methods,
            is_static = compiled.is_static,
            "compiled route"
        );

        Ok(Self {
            rule,
            methods,
            handler,
            endpoint,
            pattern: compiled.pattern,
            regex,
            decoders: compiled.decoders,
            builder: compiled.builder,
            is_static: compiled.is_static,
        })
    }
}

impl<H> Route<H> {
    pub fn rule(&self) -> &str {
        &self.rule
    }

    pub fn methods(&self) -> &BTreeSet<String> {
        &self.methods
    }

    pub fn allows(&self, method: &str) -> bool {
        self.methods.contains(method)
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Regex source, or the literal key for static routes
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.decoders.iter().map(|(name, _)| name.as_str())
    }

    /// Reconstruction tokens, literal text and encoders in rule order
    pub fn builder(&self) -> &[BuildToken] {
        &self.builder
    }

    /// Path-only test, ignoring methods and skipping decoding
    pub fn matches_path(&self, path: &str) -> bool {
        match &self.regex {
            Some(regex) => regex.is_match(path),
            None => self.pattern == path,
        }
    }

    /// Matches `path` under `method` and decodes the captured segments
    ///
    /// Returns `Ok(None)` for a wrong method (without touching the pattern) or a
    /// path that does not match. A segment that matches its filter pattern but
    /// fails to decode is [`ResolveError::BadRequest`], not a miss.
    pub fn matches(&self, path: &str, method: &str) -> Result<Option<Params>, ResolveError> {
        if !self.allows(method) {
            return Ok(None);
        }

        let Some(regex) = &self.regex else {
            return Ok((self.pattern == path).then(Vec::new));
        };

        let Some(caps) = regex.captures(path) else {
            return Ok(None);
        };

        self.decoders
            .iter()
            .map(|(name, decode)| {
                let raw = caps.name(name).map_or("", |m| m.as_str());
                decode(raw).map_err(|source| ResolveError::BadRequest {
                    rule: self.rule.clone(),
                    param: name.clone(),
                    source,
                })
            })
            .collect::<Result<Params, _>>()
            .map(Some)
    }
}

impl<H> RouteMatcher for Route<H> {
    fn match_route(&self, path: &str, method: &str) -> Result<Option<Params>, ResolveError> {
        self.matches(path, method)
    }
}

impl<H> fmt::Debug for Route<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("rule", &self.rule)
            .field("methods", &self.methods)
            .field("endpoint", &self.endpoint)
            .field("pattern", &self.pattern)
            .field("is_static", &self.is_static)
            .finish_non_exhaustive()
    }
}

/// Collects verbs into a set, rejecting empty input and non-verbs
fn normalize_methods<I, S>(rule: &str, methods: I) -> Result<BTreeSet<String>, RouteError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let invalid = |reason: String| RouteError::InvalidMethods {
        rule: rule.to_string(),
        reason,
    };

    let methods = methods
        .into_iter()
        .map(|m| {
            let m = m.as_ref();
            if !m.is_empty() && m.bytes().all(|b| b.is_ascii_uppercase()) {
                Ok(m.to_string())
            } else {
                Err(invalid(format!("'{}' is not an uppercase HTTP verb", m)))
            }
        })
        .collect::<Result<BTreeSet<_>, _>>()?;

    if methods.is_empty() {
        return Err(invalid("at least one method is required".to_string()));
    }

    Ok(methods)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Target(&'static str, usize);

    impl RouteTarget for Target {
        fn name(&self) -> &str {
            self.0
        }

        fn arity(&self) -> usize {
            self.1
        }
    }

    fn route(rule: &str, methods: &[&str]) -> Route<Target> {
        Route::new(
            &FilterRegistry::new(),
            rule,
            methods,
            Target("temp", 0),
            RouteOptions::new().unchecked(),
        )
        .unwrap()
    }

    #[test]
    fn test_methods_normalized_to_set() {
        let r = route("/", &["GET", "POST", "GET"]);
        assert_eq!(r.methods().len(), 2);
        assert!(r.allows("GET"));
        assert!(!r.allows("get"));
    }

    #[test]
    fn test_empty_methods_rejected() {
        let err = Route::new(
            &FilterRegistry::new(),
            "/",
            Vec::<String>::new(),
            Target("temp", 0),
            RouteOptions::new(),
        )
        .unwrap_err();
        assert!(matches!(err, RouteError::InvalidMethods { .. }));
    }

    #[test]
    fn test_lowercase_method_rejected() {
        let err = Route::new(
            &FilterRegistry::new(),
            "/",
            ["get"],
            Target("temp", 0),
            RouteOptions::new(),
        )
        .unwrap_err();
        assert!(matches!(err, RouteError::InvalidMethods { .. }));
    }

    #[test]
    fn test_joined_methods_rejected() {
        let err = Route::new(
            &FilterRegistry::new(),
            "/",
            ["GET,POST"],
            Target("temp", 0),
            RouteOptions::new(),
        )
        .unwrap_err();
        assert!(matches!(err, RouteError::InvalidMethods { .. }));
    }

    #[test]
    fn test_endpoint_defaults_to_handler_name() {
        assert_eq!(route("/", &["GET"]).endpoint(), "temp");

        let named = Route::new(
            &FilterRegistry::new(),
            "/",
            ["GET"],
            Target("temp", 0),
            RouteOptions::new().with_endpoint("index"),
        )
        .unwrap();
        assert_eq!(named.endpoint(), "index");
    }

    #[test]
    fn test_arity_checked_by_default() {
        let err = Route::new(
            &FilterRegistry::new(),
            "/users/<int:id>",
            ["GET"],
            Target("list_users", 0),
            RouteOptions::new(),
        )
        .unwrap_err();
        match err {
            RouteError::ArityMismatch {
                endpoint,
                expected,
                found,
                ..
            } => {
                assert_eq!(endpoint, "list_users");
                assert_eq!(expected, 1);
                assert_eq!(found, 0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_arity_match_passes() {
        let ok = Route::new(
            &FilterRegistry::new(),
            "/users/<int:id>/<slug>",
            ["GET"],
            Target("show", 2),
            RouteOptions::new(),
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn test_wrong_method_skips_pattern() {
        let r = route("/hello/<name>", &["GET"]);
        assert_eq!(r.matches("/hello/mike", "POST").unwrap(), None);
        assert!(r.matches_path("/hello/mike"));
    }

    #[test]
    fn test_static_route_matches_exactly() {
        let r = route("/test", &["GET"]);
        assert!(r.is_static());
        assert_eq!(r.matches("/test", "GET").unwrap(), Some(vec![]));
        assert_eq!(r.matches("/testtest", "GET").unwrap(), None);
    }

    #[test]
    fn test_match_is_full_string() {
        let r = route("/test/<int:age>", &["GET"]);
        assert_eq!(r.matches("/test/1", "GET").unwrap(), Some(vec![Value::Int(1)]));
        assert_eq!(r.matches("/test1.o", "GET").unwrap(), None);
        assert_eq!(r.matches("/test/1/extra", "GET").unwrap(), None);
        assert_eq!(r.matches("/prefix/test/1", "GET").unwrap(), None);
    }

    #[test]
    fn test_decode_failure_is_bad_request() {
        let r = route("/price/<float:amount>", &["GET"]);
        let err = r.matches("/price/1.2.3", "GET").unwrap_err();
        assert!(matches!(err, ResolveError::BadRequest { ref param, .. } if param == "amount"));
    }
}
