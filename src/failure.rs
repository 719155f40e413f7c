//! Middleware failures.
//!
//! A middleware stops the chain by returning `Err(Failure)`. The failure
//! travels unchanged out of the executor and is turned into a [`Response`]
//! by the function handler:
//!
//! | Variant            | Status              | Body                       | Headers                |
//! |--------------------|---------------------|----------------------------|------------------------|
//! | `Http(HttpError)`  | its own, else `500` | its own, else the failure  | its own, else defaults |
//! | `Raw(Value)`       | `500`               | the payload                | defaults               |
//! | `Error(BoxError)`  | `500`               | the error message          | defaults               |
//!
//! A bodyless `Http` failure answers with its own serialized shape, so a
//! caller still sees the status and headers it carried.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::response::{Headers, Response, ResponseBuilder};

/// Any boxed error a middleware may bubble up.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// ── HttpError ─────────────────────────────────────────────────────────────────

/// A structured failure: an error that also says how to answer the caller.
///
/// Every field is optional. Build one field by field, or with
/// [`ResponseBuilder::http_error`] which fills in `400` and the default
/// headers.
///
/// ```rust
/// use fnchain::HttpError;
/// use serde_json::json;
///
/// let err = HttpError::new(400, json!({ "message": "rejected" }));
/// let res = err.to_response();
/// assert_eq!(res.status(), 400);
/// assert_eq!(res.header("content-type"), Some("application/json"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Headers>,
}

impl HttpError {
    /// A failure with a status and body, leaving headers to the defaults.
    pub fn new(status: u16, body: impl Into<Value>) -> Self {
        Self { status: Some(status), body: Some(body.into()), headers: None }
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Converts back into a response. Status defaults to `500` when absent;
    /// the body is carried over as-is, even when absent.
    pub fn to_response(&self) -> Response {
        ResponseBuilder {
            status: self.status,
            body: self.body.clone(),
            headers: self.headers.clone(),
        }
        .internal_error()
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("http error")?;
        if let Some(status) = self.status {
            write!(f, " {status}")?;
        }
        if let Some(body) = &self.body {
            write!(f, ": {body}")?;
        }
        Ok(())
    }
}

impl std::error::Error for HttpError {}

// ── Failure ──────────────────────────────────────────────────────────────────

/// Everything a middleware can fail with.
#[derive(Debug, thiserror::Error)]
pub enum Failure {
    /// Carries its own status, body and headers.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// An opaque payload with no response shape of its own.
    #[error("raw failure: {0}")]
    Raw(Value),

    /// Any other error.
    #[error("{0}")]
    Error(BoxError),
}

impl Failure {
    pub fn raw(payload: impl Into<Value>) -> Self {
        Self::Raw(payload.into())
    }

    pub fn other(err: impl Into<BoxError>) -> Self {
        Self::Error(err.into())
    }

    /// The status the failure will be answered with.
    pub fn status(&self) -> u16 {
        match self {
            Self::Http(err) => err.status.unwrap_or(500),
            Self::Raw(_) | Self::Error(_) => 500,
        }
    }

    /// Converts the failure into the response the host will see.
    pub fn into_response(self) -> Response {
        match self {
            Self::Http(err) => {
                // Without a body of its own the failure answers with itself.
                let body = match err.body.clone() {
                    Some(body) => body,
                    None => serde_json::to_value(&err)
                        .unwrap_or_else(|_| Value::String(err.to_string())),
                };
                let HttpError { status, headers, .. } = err;
                ResponseBuilder { status, body: Some(body), headers }.internal_error()
            }
            Self::Raw(payload) => Response::builder().body(payload).internal_error(),
            Self::Error(err) => Response::builder().body(err.to_string()).internal_error(),
        }
    }
}

/// Returning a finished response as a failure answers with that response.
impl From<Response> for Failure {
    fn from(res: Response) -> Self {
        let (status, body, headers) = res.into_parts();
        Self::Http(HttpError { status: Some(status), body, headers: Some(headers) })
    }
}

impl From<serde_json::Error> for Failure {
    fn from(err: serde_json::Error) -> Self {
        Self::Error(Box::new(err))
    }
}
