//! Unified error type.

/// The error type returned by fnchain's own fallible operations.
///
/// Middleware failures are not `Error`s; they are [`Failure`](crate::Failure)
/// values and end up as responses. This type covers the plumbing around the
/// chain: reading configuration and handing a response to an `http` host.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("http: {0}")]
    Http(#[from] http::Error),

    #[error("config: invalid value {value:?} for {key}")]
    Config { key: &'static str, value: String },
}
