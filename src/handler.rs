//! The function handler: what the host actually invokes.
//!
//! # One invocation
//!
//! ```text
//! host ──ctx, args──▶ FunctionHandler::call
//!                        │
//!                        ├─ log args            (log_request)
//!                        ├─ execute(chain) ──ok──────────────┐
//!                        │        └──err──▶ log (log_error)  │
//!                        │                  Failure → Response│
//!                        │                  ctx.set_res       │
//!                        └─ ctx.done() ◀──────────────────────┘   always
//! ```
//!
//! The handler never fails. Whatever a middleware raises becomes the
//! response, and a middleware that panics is answered like one that
//! returned an ordinary error; a chain that succeeds without setting a response leaves the
//! slot empty and the host decides what that means.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use serde_json::Value;
use tracing::{debug, error, info, info_span, Instrument};

use crate::config::HandlerConfig;
use crate::context::Context;
use crate::executor::execute;
use crate::failure::Failure;
use crate::middleware::{self, BoxFuture, BoxedMiddleware, Middleware};
use crate::response::Response;

/// An ordered middleware chain plus its logging configuration.
///
/// Build it once at startup and share it; cloning copies the chain's
/// `Arc`s, not the middleware.
///
/// ```rust
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use fnchain::{Context, FunctionHandler, HttpError, Response};
/// use serde_json::json;
///
/// let handler = FunctionHandler::new()
///     .with_sync_fn(|ctx, _args| {
///         ctx.pass_down_mut().insert("name".into(), json!("albert"));
///         Ok(())
///     })
///     .with_sync_fn(|ctx, _args| {
///         if ctx.pass_down()["name"] == "albert" {
///             return Err(HttpError::new(400, json!({ "message": "rejected" })).into());
///         }
///         ctx.set_res(Response::json(json!({ "ok": true })));
///         Ok(())
///     });
///
/// let mut ctx = Context::new();
/// handler.call(&mut ctx, &[]).await;
///
/// let res = ctx.res().unwrap();
/// assert_eq!(res.status(), 400);
/// assert_eq!(res.body(), Some(&json!({ "message": "rejected" })));
/// assert!(ctx.is_done());
/// # }
/// ```
#[derive(Clone, Default)]
pub struct FunctionHandler {
    middlewares: Vec<BoxedMiddleware>,
    config: HandlerConfig,
}

impl FunctionHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a middleware. Registration order is execution order.
    pub fn with(mut self, middleware: impl Middleware) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Appends an async closure; see [`middleware::from_fn`].
    pub fn with_fn<F>(self, f: F) -> Self
    where
        F: for<'a> Fn(&'a mut Context, &'a [Value]) -> BoxFuture<'a, Result<(), Failure>>
            + Send
            + Sync
            + 'static,
    {
        self.with(middleware::from_fn(f))
    }

    /// Appends a synchronous closure; see [`middleware::from_sync_fn`].
    pub fn with_sync_fn<F>(self, f: F) -> Self
    where
        F: Fn(&mut Context, &[Value]) -> Result<(), Failure> + Send + Sync + 'static,
    {
        self.with(middleware::from_sync_fn(f))
    }

    pub fn config(mut self, config: HandlerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn middlewares(&self) -> &[BoxedMiddleware] { &self.middlewares }

    /// Runs the chain for one invocation.
    ///
    /// Runs inside the context's span, or a fresh `invocation` span when the
    /// host supplied none. Always finishes with [`Context::done`].
    pub async fn call(&self, ctx: &mut Context, args: &[Value]) {
        let span = if ctx.span().is_none() {
            info_span!("invocation", invocation_id = %ctx.invocation_id())
        } else {
            ctx.span().clone()
        };

        self.run(ctx, args).instrument(span).await
    }

    /// Runs the chain against a fresh context and returns its response.
    pub async fn handle(&self, args: &[Value]) -> Option<Response> {
        let mut ctx = Context::new();
        self.call(&mut ctx, args).await;
        ctx.take_res()
    }

    async fn run(&self, ctx: &mut Context, args: &[Value]) {
        if self.config.log_request {
            info!(args = ?args, "request");
        }

        let outcome = AssertUnwindSafe(execute(ctx, args, &self.middlewares))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(panic_failure(payload)));

        if let Err(failure) = outcome {
            if self.config.log_error {
                error!(status = failure.status(), "middleware failed: {failure}");
            }
            ctx.set_res(failure.into_response());
        }

        ctx.done();
        debug!(status = ctx.res().map(Response::status), "invocation complete");
    }
}

// The panic message when it is a string; `panic!` payloads almost always are.
fn panic_failure(payload: Box<dyn Any + Send>) -> Failure {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "middleware panicked".to_owned());
    Failure::other(message)
}

impl fmt::Debug for FunctionHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionHandler")
            .field("middlewares", &self.middlewares.iter().map(|m| m.name()).collect::<Vec<_>>())
            .field("config", &self.config)
            .finish()
    }
}
