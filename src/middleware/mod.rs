//! Middleware trait and the closure adapters.
//!
//! A middleware is one step of a function's pipeline. It receives the shared
//! [`Context`] and the host's trigger arguments, may read or change the
//! context, and either succeeds or stops the chain with a [`Failure`].
//!
//! # Three ways to write one
//!
//! ```rust
//! use fnchain::middleware::{self, BoxFuture, Middleware};
//! use fnchain::{Context, Failure, HttpError, Response};
//! use serde_json::{json, Value};
//!
//! // 1. a plain closure
//! let tag = middleware::from_sync_fn(|ctx, _args| {
//!     ctx.pass_down_mut().insert("seen".into(), json!(true));
//!     Ok(())
//! });
//!
//! // 2. an async closure returning a boxed future
//! let reply = middleware::from_fn(|ctx, _args| Box::pin(async move {
//!     ctx.set_res(Response::json(json!({ "ok": true })));
//!     Ok(())
//! }));
//!
//! // 3. a type implementing the trait
//! struct RequireUser;
//!
//! impl Middleware for RequireUser {
//!     fn call<'a>(
//!         &'a self,
//!         ctx: &'a mut Context,
//!         _args: &'a [Value],
//!     ) -> BoxFuture<'a, Result<(), Failure>> {
//!         Box::pin(async move {
//!             match ctx.pass_down().get("user") {
//!                 Some(_) => Ok(()),
//!                 None => Err(Failure::from(HttpError::new(401, json!({ "message": "who are you" })))),
//!             }
//!         })
//!     }
//! }
//! ```
//!
//! # How closures are stored
//!
//! A chain holds middleware of different concrete types, so each one is
//! erased to `Arc<dyn Middleware>` ([`BoxedMiddleware`]). Calling it is one
//! virtual call returning a [`BoxFuture`] that borrows the context for as
//! long as the middleware runs.

use std::future::{self, Future};
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::context::Context;
use crate::failure::Failure;

/// A heap-allocated, type-erased future borrowing from its caller for `'a`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A type-erased middleware, shareable across invocations.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// One step of the pipeline.
///
/// `call` gets exclusive access to the context until its future resolves; the
/// next middleware does not start before that.
pub trait Middleware: Send + Sync + 'static {
    fn call<'a>(
        &'a self,
        ctx: &'a mut Context,
        args: &'a [Value],
    ) -> BoxFuture<'a, Result<(), Failure>>;

    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<M: Middleware + ?Sized> Middleware for Arc<M> {
    fn call<'a>(
        &'a self,
        ctx: &'a mut Context,
        args: &'a [Value],
    ) -> BoxFuture<'a, Result<(), Failure>> {
        (**self).call(ctx, args)
    }

    fn name(&self) -> &str { (**self).name() }
}

impl<M: Middleware + ?Sized> Middleware for Box<M> {
    fn call<'a>(
        &'a self,
        ctx: &'a mut Context,
        args: &'a [Value],
    ) -> BoxFuture<'a, Result<(), Failure>> {
        (**self).call(ctx, args)
    }

    fn name(&self) -> &str { (**self).name() }
}

// ── Closure adapters ──────────────────────────────────────────────────────────

/// Wraps an async closure.
///
/// The closure must return its future boxed, `|ctx, args| Box::pin(async move
/// { .. })`, so the future may hold on to `ctx` across awaits.
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: for<'a> Fn(&'a mut Context, &'a [Value]) -> BoxFuture<'a, Result<(), Failure>>
        + Send
        + Sync
        + 'static,
{
    FromFn(f)
}

/// Wraps a synchronous closure.
pub fn from_sync_fn<F>(f: F) -> FromSyncFn<F>
where
    F: Fn(&mut Context, &[Value]) -> Result<(), Failure> + Send + Sync + 'static,
{
    FromSyncFn(f)
}

/// Middleware built by [`from_fn`].
pub struct FromFn<F>(F);

impl<F> Middleware for FromFn<F>
where
    F: for<'a> Fn(&'a mut Context, &'a [Value]) -> BoxFuture<'a, Result<(), Failure>>
        + Send
        + Sync
        + 'static,
{
    fn call<'a>(
        &'a self,
        ctx: &'a mut Context,
        args: &'a [Value],
    ) -> BoxFuture<'a, Result<(), Failure>> {
        (self.0)(ctx, args)
    }
}

/// Middleware built by [`from_sync_fn`].
pub struct FromSyncFn<F>(F);

impl<F> Middleware for FromSyncFn<F>
where
    F: Fn(&mut Context, &[Value]) -> Result<(), Failure> + Send + Sync + 'static,
{
    fn call<'a>(
        &'a self,
        ctx: &'a mut Context,
        args: &'a [Value],
    ) -> BoxFuture<'a, Result<(), Failure>> {
        // Runs now; the executor awaits the ready future straight away.
        Box::pin(future::ready((self.0)(ctx, args)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::HttpError;
    use serde_json::json;

    struct Stamp(&'static str);

    impl Middleware for Stamp {
        fn call<'a>(
            &'a self,
            ctx: &'a mut Context,
            _args: &'a [Value],
        ) -> BoxFuture<'a, Result<(), Failure>> {
            Box::pin(async move {
                ctx.pass_down_mut().insert(self.0.to_owned(), json!(true));
                Ok(())
            })
        }

        fn name(&self) -> &str { self.0 }
    }

    #[tokio::test]
    async fn test_trait_impl() {
        let mut ctx = Context::new();
        Stamp("first").call(&mut ctx, &[]).await.unwrap();
        assert_eq!(ctx.pass_down()["first"], true);
    }

    #[tokio::test]
    async fn test_erased_keeps_name() {
        let boxed: BoxedMiddleware = Arc::new(Stamp("stamp"));
        assert_eq!(boxed.name(), "stamp");

        let mut ctx = Context::new();
        boxed.call(&mut ctx, &[]).await.unwrap();
        assert!(ctx.pass_down().contains_key("stamp"));
    }

    #[tokio::test]
    async fn test_from_fn_sees_args() {
        let mw = from_fn(|ctx, args| Box::pin(async move {
            tokio::task::yield_now().await;
            ctx.pass_down_mut().insert("argc".into(), json!(args.len()));
            Ok(())
        }));

        let mut ctx = Context::new();
        mw.call(&mut ctx, &[json!("a"), json!("b")]).await.unwrap();
        assert_eq!(ctx.pass_down()["argc"], 2);
    }

    #[tokio::test]
    async fn test_from_sync_fn_propagates_failure() {
        let mw = from_sync_fn(|_ctx, _args| Err(HttpError::new(403, json!("nope")).into()));

        let mut ctx = Context::new();
        let err = mw.call(&mut ctx, &[]).await.unwrap_err();
        assert_eq!(err.status(), 403);
    }
}
