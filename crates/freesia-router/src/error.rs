//! Error types for rule compilation and request resolution.
//!
//! Errors fall into two epochs:
//!
//! - [`RouteError`] - raised while routes are being registered. Any of these
//!   means the routing table is inconsistent and startup must abort.
//! - [`ResolveError`] - raised per request. These translate into 4xx
//!   responses and never poison the router.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::filter::DecodeError;

/// Registration-time failures.
#[derive(Error, Debug)]
pub enum RouteError {
    /// A placeholder names a filter that was never registered.
    #[error(
        "url filter '{filter}' used by rule '{rule}' is not registered; \
         register it before compiling rules that use it"
    )]
    UnknownFilter { rule: String, filter: String },

    /// Placeholder count disagrees with the handler's declared parameters.
    #[error(
        "rule '{rule}' asks for {expected} params, but endpoint '{endpoint}' accepts {found}"
    )]
    ArityMismatch {
        rule: String,
        endpoint: String,
        expected: usize,
        found: usize,
    },

    /// The methods collection is empty or holds something that is not a verb.
    #[error("invalid methods for rule '{rule}': {reason}")]
    InvalidMethods { rule: String, reason: String },

    /// The same parameter name appears twice in one rule.
    #[error("rule '{rule}' declares parameter '{name}' more than once")]
    DuplicateParam { rule: String, name: String },

    /// The assembled pattern was rejected by the regex engine.
    #[error("rule '{rule}' compiles to an invalid pattern")]
    InvalidPattern {
        rule: String,
        #[source]
        source: regex::Error,
    },
}

/// Request-time failures returned by [`Router::resolve`](crate::Router::resolve).
#[derive(Error, Debug)]
pub enum ResolveError {
    /// No registered rule matches the path.
    #[error("no route matches '{path}'")]
    NotFound { path: String },

    /// The path matches, but only under other methods.
    #[error("method {method} is not allowed for '{path}'")]
    MethodNotAllowed {
        path: String,
        method: String,
        allowed: BTreeSet<String>,
    },

    /// A segment matched its filter pattern but failed typed decoding.
    #[error("bad value for parameter '{param}' of rule '{rule}'")]
    BadRequest {
        rule: String,
        param: String,
        #[source]
        source: DecodeError,
    },
}

impl ResolveError {
    /// HTTP status code this failure maps to.
    pub fn status_code(&self) -> u16 {
        match self {
            ResolveError::NotFound { .. } => 404,
            ResolveError::MethodNotAllowed { .. } => 405,
            ResolveError::BadRequest { .. } => 400,
        }
    }

    /// Methods to advertise in an `Allow` header, if any.
    pub fn allowed_methods(&self) -> Option<&BTreeSet<String>> {
        match self {
            ResolveError::MethodNotAllowed { allowed, .. } => Some(allowed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let not_found = ResolveError::NotFound {
            path: "/nope".to_string(),
        };
        assert_eq!(not_found.status_code(), 404);
        assert!(not_found.allowed_methods().is_none());

        let not_allowed = ResolveError::MethodNotAllowed {
            path: "/test".to_string(),
            method: "POST".to_string(),
            allowed: BTreeSet::from(["GET".to_string()]),
        };
        assert_eq!(not_allowed.status_code(), 405);
        assert_eq!(not_allowed.allowed_methods().map(|m| m.len()), Some(1));
    }

    #[test]
    fn test_unknown_filter_message_names_rule_and_filter() {
        let err = RouteError::UnknownFilter {
            rule: "/x/<uuid:id>".to_string(),
            filter: "uuid".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("uuid"));
        assert!(msg.contains("/x/<uuid:id>"));
    }
}
