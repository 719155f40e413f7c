//! Response records, the builder that produces them, and the
//! [`IntoResponse`] conversion trait.
//!
//! A [`Response`] is what a function hands back to its host: a status, an
//! optional body, and a flat header map. Every constructor applies the same
//! two rules:
//!
//! - **Status** defaults per constructor (`success` → 200, `bad_request` →
//!   400, `internal_error` → 500). An explicit status always wins.
//! - **Headers** default to the CORS/JSON set below. Supplying *any* header
//!   replaces that set wholesale. There is no per-key merge.
//!
//! ```rust
//! use fnchain::Response;
//! use serde_json::json;
//!
//! let ok = Response::json(json!({ "id": 1 }));
//! assert_eq!(ok.status(), 200);
//! assert_eq!(ok.header("content-type"), Some("application/json"));
//!
//! let rejected = Response::builder()
//!     .body(json!({ "message": "name is required" }))
//!     .bad_request();
//! assert_eq!(rejected.status(), 400);
//!
//! let custom = Response::builder()
//!     .status(201)
//!     .header("Location", "/users/42")
//!     .build();
//! assert_eq!(custom.headers().len(), 1);
//! ```

use std::collections::BTreeMap;

use bytes::Bytes;
use http_body_util::Full;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;
use crate::failure::{Failure, HttpError};

/// Header map carried by a [`Response`]. Keys keep the case they were given.
pub type Headers = BTreeMap<String, String>;

const STATUS_OK: u16 = 200;
const STATUS_BAD_REQUEST: u16 = 400;
const STATUS_INTERNAL_ERROR: u16 = 500;

/// The header set used whenever a caller supplies none.
pub fn default_headers() -> Headers {
    [
        ("Access-Control-Allow-Origin", "*"),
        ("Access-Control-Allow-Credentials", "true"),
        ("Content-Type", "application/json"),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_owned(), value.to_owned()))
    .collect()
}

// ── Response ─────────────────────────────────────────────────────────────────

/// A canonical response record: `{ status, body, headers }`.
///
/// Records are immutable once built. Middleware that wants a different
/// response builds a new one and stores it with
/// [`Context::set_res`](crate::Context::set_res).
///
/// The body is passed through untouched. Serialising it for the wire is the
/// host's job; [`Response::into_http`] does that for `http`-based hosts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    body: Option<Value>,
    #[serde(default = "default_headers")]
    headers: Headers,
}

impl Response {
    /// `200 OK` with the default headers.
    pub fn json(body: impl Into<Value>) -> Self {
        Self::builder().body(body).success()
    }

    /// Builder for responses that need a custom status, body, or headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder::default()
    }

    pub fn status(&self) -> u16 { self.status }
    pub fn body(&self) -> Option<&Value> { self.body.as_ref() }
    pub fn headers(&self) -> &Headers { &self.headers }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn into_parts(self) -> (u16, Option<Value>, Headers) {
        (self.status, self.body, self.headers)
    }

    /// Converts the record into an `http` response.
    ///
    /// String bodies are sent verbatim, every other body as JSON, and an
    /// absent body as an empty one. Fails if the status is outside
    /// `100..=999` or a header name/value is not valid HTTP.
    pub fn into_http(self) -> Result<http::Response<Full<Bytes>>, Error> {
        let body = match self.body {
            None => Bytes::new(),
            Some(Value::String(text)) => Bytes::from(text),
            Some(value) => Bytes::from(serde_json::to_vec(&value)?),
        };

        let mut builder = http::Response::builder().status(self.status);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        Ok(builder.body(Full::new(body))?)
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Collects the optional `{ status, body, headers }` parameters.
///
/// Obtain via [`Response::builder()`]. Terminated by one of the named
/// constructors, each of which picks its own default status.
#[derive(Clone, Debug, Default)]
pub struct ResponseBuilder {
    pub(crate) status: Option<u16>,
    pub(crate) body: Option<Value>,
    pub(crate) headers: Option<Headers>,
}

impl ResponseBuilder {
    pub fn status(mut self, code: u16) -> Self {
        self.status = Some(code);
        self
    }

    pub fn body(mut self, body: impl Into<Value>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Replaces the whole header set, defaults included.
    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Adds one header. The first call discards the defaults; a later call
    /// with the same name in any case replaces the earlier value.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let headers = self.headers.get_or_insert_with(Headers::new);
        headers.retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
        headers.insert(name, value.into());
        self
    }

    /// Terminate with status defaulting to `200`.
    pub fn build(self) -> Response {
        self.finish(STATUS_OK)
    }

    /// Terminate with status defaulting to `200`.
    pub fn success(self) -> Response {
        self.finish(STATUS_OK)
    }

    /// Terminate with status defaulting to `400`.
    pub fn bad_request(self) -> Response {
        self.finish(STATUS_BAD_REQUEST)
    }

    /// Terminate with status defaulting to `500`.
    pub fn internal_error(self) -> Response {
        self.finish(STATUS_INTERNAL_ERROR)
    }

    /// Terminate with a structured failure instead of a response.
    ///
    /// The failure always carries a status (`400` unless set) and a header
    /// set, so converting it back with [`HttpError::to_response`] is lossless.
    pub fn http_error(self) -> HttpError {
        HttpError {
            status: Some(self.status.unwrap_or(STATUS_BAD_REQUEST)),
            body: self.body,
            headers: Some(self.headers.unwrap_or_else(default_headers)),
        }
    }

    fn finish(self, default_status: u16) -> Response {
        Response {
            status: self.status.unwrap_or(default_status),
            body: self.body,
            headers: self.headers.unwrap_or_else(default_headers),
        }
    }
}

// ── Named helpers ─────────────────────────────────────────────────────────────

/// Generic response, status defaults to `200`.
pub fn http_response(params: ResponseBuilder) -> Response { params.build() }

/// Success response, status defaults to `200`.
pub fn success(params: ResponseBuilder) -> Response { params.success() }

/// Client error response, status defaults to `400`.
pub fn bad_request(params: ResponseBuilder) -> Response { params.bad_request() }

/// Server error response, status defaults to `500`.
pub fn internal_error(params: ResponseBuilder) -> Response { params.internal_error() }

/// Structured failure, status defaults to `400`.
pub fn http_error(params: ResponseBuilder) -> HttpError { params.http_error() }

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into a [`Response`].
///
/// Accepted by [`Context::set_res`](crate::Context::set_res), so middleware
/// can store a finished record, an unfinished builder, or a failure.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for ResponseBuilder {
    fn into_response(self) -> Response { self.build() }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response { self.to_response() }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response { Failure::into_response(self) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::json;

    #[test]
    fn test_default_statuses() {
        let body = json!({ "message": true });
        assert_eq!(http_response(Response::builder().body(body.clone())).status(), 200);
        assert_eq!(success(Response::builder().body(body.clone())).status(), 200);
        assert_eq!(bad_request(Response::builder().body(body.clone())).status(), 400);
        assert_eq!(internal_error(Response::builder().body(body)).status(), 500);
    }

    #[test]
    fn test_explicit_status_wins() {
        assert_eq!(Response::builder().status(203).success().status(), 203);
        assert_eq!(Response::builder().status(418).bad_request().status(), 418);
        assert_eq!(Response::builder().status(201).internal_error().status(), 201);
    }

    #[test]
    fn test_bad_request_shape() {
        let res = Response::builder().body(json!({ "message": "test" })).bad_request();

        assert_eq!(res.status(), 400);
        assert_eq!(res.body(), Some(&json!({ "message": "test" })));
        assert_eq!(res.headers(), &default_headers());
    }

    #[test]
    fn test_default_headers() {
        let res = Response::json("ok");
        assert_eq!(res.headers().len(), 3);
        assert_eq!(res.header("access-control-allow-origin"), Some("*"));
        assert_eq!(res.header("Access-Control-Allow-Credentials"), Some("true"));
        assert_eq!(res.header("content-type"), Some("application/json"));
    }

    #[test]
    fn test_supplied_headers_replace_defaults() {
        let mut headers = Headers::new();
        headers.insert("Access-Control-Allow-Credentials".into(), "false".into());

        let res = Response::builder().headers(headers.clone()).success();
        assert_eq!(res.headers(), &headers);

        let res = Response::builder().header("X-Trace", "abc").bad_request();
        assert_eq!(res.headers().len(), 1);
        assert_eq!(res.header("content-type"), None);
    }

    #[test]
    fn test_header_replaces_same_name_in_any_case() {
        let res = Response::builder()
            .header("content-type", "text/plain")
            .header("Content-Type", "text/html")
            .header("X-Trace", "1")
            .build();

        assert_eq!(res.headers().len(), 2);
        assert_eq!(res.header("content-type"), Some("text/html"));
        assert_eq!(res.headers().get("Content-Type").map(String::as_str), Some("text/html"));
        assert!(!res.headers().contains_key("content-type"));

        let wire = res.into_http().unwrap();
        assert_eq!(wire.headers().get_all("content-type").iter().count(), 1);
    }

    #[test]
    fn test_empty_header_map_still_replaces() {
        let res = Response::builder().headers(Headers::new()).build();
        assert!(res.headers().is_empty());
    }

    #[test]
    fn test_primitive_bodies_pass_through() {
        assert_eq!(Response::json("test-response").body(), Some(&json!("test-response")));
        assert_eq!(Response::json(8888).body(), Some(&json!(8888)));
        assert_eq!(Response::json(true).body(), Some(&json!(true)));
        assert_eq!(Response::builder().build().body(), None);
    }

    #[test]
    fn test_http_error_defaults() {
        let err = Response::builder().body(json!({ "message": true })).http_error();
        assert_eq!(err.status, Some(400));
        assert_eq!(err.headers, Some(default_headers()));

        let err = http_error(Response::builder().status(402));
        assert_eq!(err.status, Some(402));
        assert_eq!(err.body, None);
    }

    #[test]
    fn test_serialized_shape() {
        let res = Response::builder().status(201).body(json!({ "id": 7 })).header("A", "b").build();
        assert_eq!(
            serde_json::to_value(&res).unwrap(),
            json!({ "status": 201, "body": { "id": 7 }, "headers": { "A": "b" } }),
        );

        let empty = serde_json::to_value(Response::builder().build()).unwrap();
        assert!(empty.get("body").is_none());
    }

    #[tokio::test]
    async fn test_into_http_json_body() {
        let res = Response::json(json!({ "name": "t" })).into_http().unwrap();

        assert_eq!(res.status(), http::StatusCode::OK);
        assert_eq!(res.headers()["content-type"], "application/json");
        assert_eq!(res.headers()["access-control-allow-origin"], "*");

        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], br#"{"name":"t"}"#);
    }

    #[tokio::test]
    async fn test_into_http_string_and_empty_bodies() {
        let res = Response::json("plain").into_http().unwrap();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"plain");

        let res = Response::builder().status(204).build().into_http().unwrap();
        assert_eq!(res.status(), http::StatusCode::NO_CONTENT);
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_into_http_rejects_invalid_status() {
        let res = Response::builder().status(42).build();
        assert!(matches!(res.into_http(), Err(Error::Http(_))));
    }
}
