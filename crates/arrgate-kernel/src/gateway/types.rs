//! Core data types for the gateway kernel contract.
//!
//! These types carry no runtime dependencies beyond `serde` and `std` and
//! never outlive a single relayed call.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

// ─────────────────────────────────────────────────────────────────────────────
// HTTP primitives
// ─────────────────────────────────────────────────────────────────────────────

/// HTTP method, covering the verbs a caller may ask the gateway to relay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    /// Case-insensitive parse from a string slice.
    pub fn from_str_ci(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "PATCH" => Some(HttpMethod::Patch),
            "DELETE" => Some(HttpMethod::Delete),
            "HEAD" => Some(HttpMethod::Head),
            "OPTIONS" => Some(HttpMethod::Options),
            _ => None,
        }
    }

    /// Return the standard uppercase string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Call request
// ─────────────────────────────────────────────────────────────────────────────

/// A validated description of the outbound call a caller wants performed.
///
/// Built from a [`RawCallRequest`](super::validation::RawCallRequest) once
/// the target is known to be present.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRequest {
    /// Destination URL exactly as supplied by the caller.
    pub target: String,
    /// HTTP verb (default `GET`).
    pub method: HttpMethod,
    /// Opaque payload; `None` sends no body.
    pub body: Option<Value>,
    /// Query parameters in caller order.
    pub query: Vec<(String, String)>,
    /// Headers forwarded verbatim.
    pub headers: BTreeMap<String, String>,
}

impl CallRequest {
    /// Construct a `GET` call to `target` with no body, query or headers.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            method: HttpMethod::Get,
            body: None,
            query: Vec::new(),
            headers: BTreeMap::new(),
        }
    }

    /// Builder helper: set the method.
    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    /// Builder helper: set the body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Builder helper: append a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Builder helper: attach a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Whether the caller supplied a `content-type` header (any casing).
    pub fn has_content_type(&self) -> bool {
        self.headers
            .keys()
            .any(|k| k.eq_ignore_ascii_case("content-type"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Outcome
// ─────────────────────────────────────────────────────────────────────────────

/// A completed HTTP exchange, whatever status the upstream returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    /// HTTP status code (100–599).
    pub status: u16,
    /// Canonical reason phrase, empty when the status has none.
    pub status_text: String,
    /// Response headers; repeated headers are joined with `", "`.
    pub headers: BTreeMap<String, String>,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

impl UpstreamResponse {
    /// Construct a response with no headers and an empty body.
    pub fn new(status: u16, status_text: impl Into<String>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            headers: BTreeMap::new(),
            body: Vec::new(),
        }
    }

    /// Builder helper: attach a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Builder helper: set the body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Body decoded for the relay envelope.
    ///
    /// JSON bodies are returned parsed, anything else as a (lossy) UTF-8
    /// string. An empty body is `""`.
    pub fn data(&self) -> Value {
        decode_body(&self.body)
    }
}

/// Why a transport exchange could not be completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum FailureKind {
    /// The peer actively refused the connection.
    ConnectionRefused,
    /// The target hostname did not resolve.
    HostNotFound,
    /// The per-call timeout elapsed.
    Timeout,
    /// Any other failure while establishing the connection (unreachable
    /// network, TLS handshake, reset).
    Connect,
    /// The response started but its body could not be read or was malformed.
    Body,
    /// Anything else: invalid URL, unsupported scheme, request build errors.
    Request,
}

impl FailureKind {
    /// Stable error code surfaced to callers in the diagnostic envelope.
    pub fn code(&self) -> &'static str {
        match self {
            FailureKind::ConnectionRefused => "ECONNREFUSED",
            FailureKind::HostNotFound => "ENOTFOUND",
            FailureKind::Timeout => "ETIMEDOUT",
            FailureKind::Connect => "ECONNECT",
            FailureKind::Body => "EBODY",
            FailureKind::Request => "EREQUEST",
        }
    }

    /// `true` for the kinds that mean "nothing answered at that address".
    pub fn is_unreachable(&self) -> bool {
        matches!(self, FailureKind::ConnectionRefused | FailureKind::HostNotFound)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A call that never produced a complete HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFailure {
    /// Classified failure kind.
    pub kind: FailureKind,
    /// Underlying transport error message.
    pub message: String,
    /// Status line already received before the failure, if any.
    pub status: Option<u16>,
    /// Body bytes captured before the failure, if any.
    pub partial_body: Option<Vec<u8>>,
    /// The resolved address that was actually dialed.
    pub attempted: String,
}

impl TransportFailure {
    /// Construct a failure with no status and no partial body.
    pub fn new(kind: FailureKind, message: impl Into<String>, attempted: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            partial_body: None,
            attempted: attempted.into(),
        }
    }

    /// Builder helper: record the status line received before failing.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Builder helper: record body bytes captured before failing.
    ///
    /// An empty capture is stored as `None`.
    pub fn with_partial_body(mut self, body: Vec<u8>) -> Self {
        self.partial_body = if body.is_empty() { None } else { Some(body) };
        self
    }

    /// Partial body decoded the same way as [`UpstreamResponse::data`].
    pub fn partial_data(&self) -> Option<Value> {
        self.partial_body.as_deref().map(decode_body)
    }
}

/// Result of executing a single call: exactly one variant is populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    Success(UpstreamResponse),
    Failure(TransportFailure),
}

fn decode_body(body: &[u8]) -> Value {
    if body.is_empty() {
        return Value::String(String::new());
    }
    serde_json::from_slice(body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()))
}
