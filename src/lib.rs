//! # fnchain
//!
//! Middleware chains for serverless function handlers, and the response
//! helpers that go with them.
//!
//! ## The contract
//!
//! The host owns the invocation: it delivers the trigger, runs the code, and
//! collects whatever ends up in the response slot. fnchain does not speak any
//! host's protocol. It asks the host for three things only:
//!
//! - a fresh [`Context`] per invocation,
//! - a way to be told the invocation is finished ([`Context::done`]),
//! - a response slot to read afterwards ([`Context::res`]).
//!
//! In return it runs your middleware one at a time, in the order you
//! registered them, against that one context. The first middleware that
//! fails stops the chain, and its [`Failure`] becomes the response.
//!
//! ## Quick start
//!
//! ```rust
//! use fnchain::{Context, FunctionHandler, HttpError, Response};
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let handler = FunctionHandler::new()
//!     .with_sync_fn(|ctx, args| {
//!         let name = args.first()
//!             .and_then(|req| req["query"]["name"].as_str())
//!             .ok_or_else(|| HttpError::new(400, json!({ "message": "name is required" })))?;
//!         ctx.pass_down_mut().insert("name".into(), json!(name));
//!         Ok(())
//!     })
//!     .with_sync_fn(|ctx, _args| {
//!         let name = ctx.pass_down()["name"].clone();
//!         ctx.set_res(Response::json(json!({ "hello": name })));
//!         Ok(())
//!     });
//!
//! // one Context per invocation, built by the host
//! let mut ctx = Context::new().with_invocation_id("7f3c");
//! handler.call(&mut ctx, &[json!({ "query": { "name": "ada" } })]).await;
//!
//! let res = ctx.res().unwrap();
//! assert_eq!(res.status(), 200);
//! assert_eq!(res.body(), Some(&json!({ "hello": "ada" })));
//!
//! let rejected = handler.handle(&[json!({ "query": {} })]).await.unwrap();
//! assert_eq!(rejected.status(), 400);
//! # }
//! ```

mod config;
mod context;
mod error;
mod executor;
mod failure;
mod handler;
mod response;

pub mod middleware;

pub use config::HandlerConfig;
pub use context::{Context, PassDown};
pub use error::Error;
pub use executor::execute;
pub use failure::{BoxError, Failure, HttpError};
pub use handler::FunctionHandler;
pub use middleware::{BoxFuture, BoxedMiddleware, Middleware};
pub use response::{
    bad_request, default_headers, http_error, http_response, internal_error, success, Headers,
    IntoResponse, Response, ResponseBuilder,
};
