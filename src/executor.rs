//! Queue executor.
//!
//! Runs a middleware sequence against one context, strictly one after the
//! other, and stops at the first failure:
//!
//! ```text
//! ctx ──▶ m[0] ──ok──▶ m[1] ──ok──▶ … ──ok──▶ m[n-1] ──▶ Ok(())
//!           │            │
//!          err          err
//!           ▼            ▼
//!        Err(failure)  (later middleware never run)
//! ```
//!
//! The executor only lends the context out. It never looks at the response
//! slot or the pass-down map itself.

use serde_json::Value;
use tracing::{debug, trace};

use crate::context::Context;
use crate::failure::Failure;
use crate::middleware::Middleware;

/// Invokes every middleware in order with the same context and arguments.
///
/// Each call is awaited before the next one starts. The first failure is
/// returned unchanged and nothing after it runs. An empty slice succeeds
/// without touching the context.
///
/// ```rust
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use fnchain::{execute, middleware, Context, Response};
/// use fnchain::middleware::BoxedMiddleware;
/// use std::sync::Arc;
///
/// let chain: Vec<BoxedMiddleware> = vec![
///     Arc::new(middleware::from_sync_fn(|ctx, _| {
///         ctx.set_res(Response::json("hi"));
///         Ok(())
///     })),
/// ];
///
/// let mut ctx = Context::new();
/// execute(&mut ctx, &[], &chain).await.unwrap();
/// assert_eq!(ctx.res().map(Response::status), Some(200));
/// # }
/// ```
pub async fn execute<M: Middleware>(
    ctx: &mut Context,
    args: &[Value],
    middlewares: &[M],
) -> Result<(), Failure> {
    for (index, middleware) in middlewares.iter().enumerate() {
        trace!(index, middleware = middleware.name(), "invoking middleware");

        if let Err(failure) = middleware.call(ctx, args).await {
            debug!(
                index,
                middleware = middleware.name(),
                skipped = middlewares.len() - index - 1,
                "middleware chain stopped: {failure}"
            );
            return Err(failure);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::HttpError;
    use crate::middleware::{from_fn, from_sync_fn, BoxFuture, BoxedMiddleware};
    use crate::response::Response;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Records its position; fails when told to.
    struct Recorder {
        id: usize,
        fail: bool,
        order: Arc<Mutex<Vec<usize>>>,
    }

    impl Middleware for Recorder {
        fn call<'a>(
            &'a self,
            _ctx: &'a mut Context,
            _args: &'a [Value],
        ) -> BoxFuture<'a, Result<(), Failure>> {
            Box::pin(async move {
                self.order.lock().unwrap().push(self.id);
                if self.fail {
                    return Err(Failure::Http(HttpError::new(400, json!({ "at": self.id }))));
                }
                Ok(())
            })
        }
    }

    fn recorders(n: usize, fail_at: Option<usize>, order: &Arc<Mutex<Vec<usize>>>) -> Vec<Recorder> {
        (0..n)
            .map(|id| Recorder { id, fail: fail_at == Some(id), order: Arc::clone(order) })
            .collect()
    }

    #[tokio::test]
    async fn test_runs_every_middleware_in_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let chain = recorders(7, None, &order);

        let mut ctx = Context::new();
        execute(&mut ctx, &[], &chain).await.unwrap();

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4, 5, 6]);
    }

    #[tokio::test]
    async fn test_stops_at_first_failure() {
        for fail_at in 0..5 {
            let order = Arc::new(Mutex::new(Vec::new()));
            let chain = recorders(5, Some(fail_at), &order);

            let mut ctx = Context::new();
            let err = execute(&mut ctx, &[], &chain).await.unwrap_err();

            assert_eq!(*order.lock().unwrap(), (0..=fail_at).collect::<Vec<_>>());
            match err {
                Failure::Http(e) => assert_eq!(e, HttpError::new(400, json!({ "at": fail_at }))),
                other => panic!("unexpected failure: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_empty_sequence() {
        let mut ctx = Context::new();
        let chain: Vec<BoxedMiddleware> = Vec::new();

        execute(&mut ctx, &[json!("ignored")], &chain).await.unwrap();

        assert!(ctx.res().is_none());
        assert!(ctx.pass_down().is_empty());
    }

    #[tokio::test]
    async fn test_same_args_reach_every_middleware() {
        let seen = Arc::new(AtomicUsize::new(0));
        let chain: Vec<BoxedMiddleware> = (0..3)
            .map(|_| {
                let seen = Arc::clone(&seen);
                Arc::new(from_sync_fn(move |_ctx, args| {
                    assert_eq!(args, [json!({ "method": "GET" }), json!(42)]);
                    seen.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })) as BoxedMiddleware
            })
            .collect();

        let mut ctx = Context::new();
        execute(&mut ctx, &[json!({ "method": "GET" }), json!(42)], &chain).await.unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_async_middleware_finishes_before_next_starts() {
        let chain: Vec<BoxedMiddleware> = vec![
            Arc::new(from_fn(|ctx, _| Box::pin(async move {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                ctx.pass_down_mut().insert("slow".into(), json!("done"));
                Ok(())
            }))),
            Arc::new(from_sync_fn(|ctx, _| {
                assert_eq!(ctx.pass_down()["slow"], "done");
                ctx.set_res(Response::json(json!({ "name": "t" })));
                Ok(())
            })),
        ];

        let mut ctx = Context::new();
        execute(&mut ctx, &[], &chain).await.unwrap();
        assert_eq!(ctx.res().unwrap().body(), Some(&json!({ "name": "t" })));
    }

    #[tokio::test]
    async fn test_noop_middleware_leaves_response_alone() {
        let chain: Vec<BoxedMiddleware> = vec![
            Arc::new(from_sync_fn(|ctx, _| {
                ctx.set_res(Response::builder().status(200).body(json!({ "name": "t" })).build());
                Ok(())
            })),
            Arc::new(from_sync_fn(|_ctx, _| Ok(()))),
        ];

        let mut ctx = Context::new();
        execute(&mut ctx, &[], &chain).await.unwrap();

        let res = ctx.res().unwrap();
        assert_eq!(res.status(), 200);
        assert_eq!(res.body(), Some(&json!({ "name": "t" })));
    }
}
