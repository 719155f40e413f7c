//! Minimal fnchain example: a validate → load → respond chain driven by a
//! pretend host.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! The "host" here is a loop over canned triggers. A real one would build the
//! Context from its own invocation, call the handler, and ship `ctx.res()`
//! back over its transport; `Response::into_http` covers `http`-based hosts.

use fnchain::middleware::BoxFuture;
use fnchain::{Context, Failure, FunctionHandler, HandlerConfig, HttpError, Response};
use serde_json::{json, Value};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = HandlerConfig::from_env()
        .unwrap_or_default()
        .with_log_error(true);

    let handler = FunctionHandler::new()
        .config(config)
        .with_sync_fn(require_user_id)
        .with_fn(load_user)
        .with_sync_fn(respond);

    let triggers = [
        json!({ "method": "GET", "params": { "id": "42" } }),
        json!({ "method": "GET", "params": {} }),
        json!({ "method": "GET", "params": { "id": "0" } }),
    ];

    for (n, trigger) in triggers.into_iter().enumerate() {
        let mut ctx = Context::new().with_invocation_id(format!("inv-{n}"));
        let done = ctx.on_done();

        handler.call(&mut ctx, &[trigger]).await;

        let Ok(Some(res)) = done.await else {
            println!("inv-{n}: no response");
            continue;
        };
        println!("inv-{n}: {}", serde_json::to_string(&res).expect("response is json"));

        let wire = res.into_http().expect("valid http response");
        println!("inv-{n}: http {}", wire.status());
    }
}

// Reject triggers without `params.id`, hand the id down otherwise.
fn require_user_id(ctx: &mut Context, args: &[Value]) -> Result<(), Failure> {
    let id = args.first()
        .and_then(|req| req["params"]["id"].as_str())
        .ok_or_else(|| {
            Response::builder()
                .body(json!({ "message": "missing user id" }))
                .http_error()
        })?;

    ctx.pass_down_mut().insert("id".into(), json!(id));
    Ok(())
}

// Pretend lookup. Id "0" fails with a plain payload to show the 500 path.
fn load_user<'a>(ctx: &'a mut Context, _args: &'a [Value]) -> BoxFuture<'a, Result<(), Failure>> {
    Box::pin(async move {
        tokio::task::yield_now().await;

        let id = ctx.pass_down()["id"].as_str().unwrap_or_default().to_owned();
        if id == "0" {
            return Err(Failure::raw(json!({ "reason": "user store unavailable" })));
        }

        ctx.pass_down_mut().insert("user".into(), json!({ "id": id, "name": "alice" }));
        Ok(())
    })
}

fn respond(ctx: &mut Context, _args: &[Value]) -> Result<(), Failure> {
    let user = ctx.pass_down().get("user").cloned().ok_or_else(|| HttpError::new(404, "no user"))?;
    ctx.set_res(Response::json(user));
    Ok(())
}
