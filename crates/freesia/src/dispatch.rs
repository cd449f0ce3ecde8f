// File: src/dispatch.rs
// Purpose: Turn router outcomes into HTTP responses

use std::sync::Arc;

use axum::body::to_bytes;
use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use freesia_router::{ResolveError, Router};

use crate::handler::BoxedHandler;
use crate::request_context::{decode_path, RequestContext};

/// Largest request body collected into [`RequestContext::body`]
pub const BODY_LIMIT: usize = 2 * 1024 * 1024;

pub(crate) type SharedRouter = Arc<Router<BoxedHandler>>;

/// Fallback service: resolve once, then call the handler with the decoded params
///
/// The router sees the percent-decoded path, with `%2F` left encoded.
pub(crate) async fn dispatch(State(router): State<SharedRouter>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let path = decode_path(parts.uri.path());

    let (handler, params) = match router.resolve(&path, parts.method.as_str()) {
        Ok(resolved) => {
            tracing::debug!(
                method = %parts.method,
                path = %path,
                endpoint = %resolved.endpoint(),
                params = ?resolved.params,
                "resolved"
            );
            (resolved.handler().clone(), resolved.params)
        }
        Err(err) => {
            tracing::warn!(
                method = %parts.method,
                path = %path,
                status = err.status_code(),
                error = %err,
                "routing failed"
            );
            return error_response(&err);
        }
    };

    let body = match to_bytes(body, BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "failed to read request body");
            return (StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large").into_response();
        }
    };

    handler.call(RequestContext::from_parts(&parts, body), params).await
}

/// 404, 405 with an `Allow` header, or 400
pub fn error_response(err: &ResolveError) -> Response {
    match err {
        ResolveError::NotFound { .. } => (StatusCode::NOT_FOUND, "Not Found").into_response(),
        ResolveError::MethodNotAllowed { allowed, .. } => {
            let allow = allowed.iter().map(String::as_str).collect::<Vec<_>>().join(", ");
            (
                StatusCode::METHOD_NOT_ALLOWED,
                [(header::ALLOW, allow)],
                "Method Not Allowed",
            )
                .into_response()
        }
        ResolveError::BadRequest { source, .. } => (
            StatusCode::BAD_REQUEST,
            format!("Bad Request: {}: {}", err, source),
        )
            .into_response(),
    }
}
