// File: src/handler.rs
// Purpose: Async handler functions, typed parameter conversion and type erasure

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use freesia_router::{Params, RouteTarget, Value};
use thiserror::Error;

use crate::request_context::RequestContext;

/// Boxed response future produced by every erased handler
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// A decoded path value that does not fit the handler's declared parameter type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FromValueError {
    #[error("expected {expected}, got {found}")]
    Mismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("missing path parameter at position {0}")]
    Missing(usize),
}

// ============================================================================
// FromValue
// ============================================================================

/// Conversion from a decoded path value into a handler argument
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, FromValueError>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, FromValueError> {
        Ok(value)
    }
}

/// Any value renders as a string, so `String` accepts every filter
impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, FromValueError> {
        match value {
            Value::String(s) => Ok(s),
            other => Ok(other.to_string()),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self, FromValueError> {
        value.as_int().ok_or(FromValueError::Mismatch {
            expected: "int",
            found: value.kind(),
        })
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> Result<Self, FromValueError> {
        let found = value.kind();
        i64::from_value(value)?
            .try_into()
            .map_err(|_| FromValueError::Mismatch {
                expected: "i32",
                found,
            })
    }
}

impl FromValue for u64 {
    fn from_value(value: Value) -> Result<Self, FromValueError> {
        let found = value.kind();
        i64::from_value(value)?
            .try_into()
            .map_err(|_| FromValueError::Mismatch {
                expected: "unsigned int",
                found,
            })
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, FromValueError> {
        value.as_float().ok_or(FromValueError::Mismatch {
            expected: "float",
            found: value.kind(),
        })
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, FromValueError> {
        value.as_bool().ok_or(FromValueError::Mismatch {
            expected: "bool",
            found: value.kind(),
        })
    }
}

// ============================================================================
// Handler
// ============================================================================

/// An async function `fn(RequestContext, T1, .., Tn) -> impl IntoResponse`
///
/// Implemented for functions and closures with up to six typed parameters.
/// `Args` is the tuple of parameter types and only serves to keep the
/// implementations apart.
pub trait Handler<Args>: Clone + Send + Sync + 'static {
    /// Number of path parameters the function takes after the context
    const ARITY: usize;

    fn call(&self, ctx: RequestContext, params: Params) -> BoxFuture;
}

macro_rules! impl_handler {
    ($arity:expr; $($ty:ident),*) => {
        impl<F, Fut, R, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: Fn(RequestContext, $($ty,)*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = R> + Send + 'static,
            R: IntoResponse,
            $($ty: FromValue + Send + 'static,)*
        {
            const ARITY: usize = $arity;

            #[allow(non_snake_case, unused_mut, unused_variables, unused_assignments)]
            fn call(&self, ctx: RequestContext, params: Params) -> BoxFuture {
                if params.len() != Self::ARITY {
                    let found = params.len();
                    tracing::error!(
                        expected = Self::ARITY,
                        found,
                        path = %ctx.path,
                        "handler called with wrong parameter count"
                    );
                    return Box::pin(async {
                        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
                    });
                }

                let mut iter = params.into_iter();
                let mut position = 0usize;
                let converted = (|| -> Result<_, FromValueError> {
                    Ok(($(
                        {
                            let value = take_param::<$ty>(&mut iter, position)?;
                            position += 1;
                            value
                        },
                    )*))
                })();

                match converted {
                    Ok(($($ty,)*)) => {
                        let fut = (self)(ctx, $($ty,)*);
                        Box::pin(async move { fut.await.into_response() })
                    }
                    Err(e) => Box::pin(async move {
                        (StatusCode::BAD_REQUEST, format!("Bad Request: {}", e)).into_response()
                    }),
                }
            }
        }
    };
}

/// Converts the next decoded value; `position` is its index in the rule
fn take_param<T: FromValue>(
    params: &mut impl Iterator<Item = Value>,
    position: usize,
) -> Result<T, FromValueError> {
    let value = params.next().ok_or(FromValueError::Missing(position))?;
    T::from_value(value).map_err(|e| {
        tracing::debug!(position, error = %e, "path parameter conversion failed");
        e
    })
}

impl_handler!(0;);
impl_handler!(1; T1);
impl_handler!(2; T1, T2);
impl_handler!(3; T1, T2, T3);
impl_handler!(4; T1, T2, T3, T4);
impl_handler!(5; T1, T2, T3, T4, T5);
impl_handler!(6; T1, T2, T3, T4, T5, T6);

// ============================================================================
// Type erasure
// ============================================================================

type CallFn = Arc<dyn Fn(RequestContext, Params) -> BoxFuture + Send + Sync>;

/// A type-erased handler with its name and arity, as stored in the router
#[derive(Clone)]
pub struct BoxedHandler {
    name: String,
    arity: usize,
    call: CallFn,
}

impl BoxedHandler {
    /// Erases a handler; the name defaults to the function's own name
    pub fn new<H, Args>(handler: H) -> Self
    where
        H: Handler<Args>,
        Args: 'static,
    {
        Self {
            name: handler_name::<H>(),
            arity: H::ARITY,
            call: Arc::new(move |ctx, params| handler.call(ctx, params)),
        }
    }

    pub(crate) fn from_fn<F>(name: impl Into<String>, arity: usize, call: F) -> Self
    where
        F: Fn(RequestContext, Params) -> BoxFuture + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            arity,
            call: Arc::new(call),
        }
    }

    pub fn call(&self, ctx: RequestContext, params: Params) -> BoxFuture {
        (self.call)(ctx, params)
    }
}

impl RouteTarget for BoxedHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn arity(&self) -> usize {
        self.arity
    }
}

impl std::fmt::Debug for BoxedHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxedHandler")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

/// Last path segment of the handler's type name
///
/// `my_app::views::show_user` becomes `show_user`. Closures report the
/// enclosing function.
fn handler_name<H>() -> String {
    let full = std::any::type_name::<H>();
    let mut trimmed = full;
    while let Some(rest) = trimmed.strip_suffix("::{{closure}}") {
        trimmed = rest;
    }
    trimmed.rsplit("::").next().unwrap_or(trimmed).to_string()
}
