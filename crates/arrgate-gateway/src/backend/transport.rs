//! Outbound call execution.
//!
//! [`HttpTransport`] performs one HTTP exchange per call with `reqwest` and
//! folds every outcome into a [`CallOutcome`]:
//!
//! - any status the peer returns, 4xx and 5xx included, is a
//!   [`CallOutcome::Success`]; the gateway relays, it does not judge;
//! - anything that prevents a complete exchange (refused connection, DNS
//!   failure, timeout, TLS or body errors) is a [`CallOutcome::Failure`]
//!   carrying the classified [`FailureKind`].
//!
//! Calls are never retried here: the gateway cannot know whether an
//! arbitrary forwarded call is idempotent.

use crate::error::{GatewayError, GatewayResult};
use arrgate_kernel::gateway::{
    CallOutcome, CallRequest, FailureKind, HttpMethod, ResolvedAddress, TransportFailure,
    UpstreamResponse,
};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use reqwest::{Client, Method};
use serde_json::Value;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::error::Error as StdError;
use std::io;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

/// Executes a single outbound call against an already-resolved address.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform the exchange, bounded by `timeout`.
    ///
    /// Never fails: transport problems are reported as
    /// [`CallOutcome::Failure`].
    async fn execute(
        &self,
        call: &CallRequest,
        resolved: &ResolvedAddress,
        timeout: Duration,
    ) -> CallOutcome;
}

/// `reqwest`-backed [`Transport`].
///
/// The underlying client is cheap to clone and pools connections
/// internally; no other state is shared between calls.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> GatewayResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| GatewayError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client))
    }

    /// Wrap an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, call), fields(method = %call.method, resolved = %resolved))]
    async fn execute(
        &self,
        call: &CallRequest,
        resolved: &ResolvedAddress,
        timeout: Duration,
    ) -> CallOutcome {
        let start = Instant::now();

        let mut builder = self
            .client
            .request(to_reqwest_method(call.method), resolved.as_str())
            .timeout(timeout);

        if !call.query.is_empty() {
            builder = builder.query(&call.query);
        }
        for (name, value) in &call.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        match &call.body {
            None => {}
            Some(Value::String(text)) => builder = builder.body(text.clone()),
            Some(json) => {
                if !call.has_content_type() {
                    builder = builder.header(CONTENT_TYPE, "application/json");
                }
                builder = builder.body(json.to_string());
            }
        }

        let mut response = match builder.send().await {
            Ok(r) => r,
            Err(e) => return CallOutcome::Failure(failure_from(&e, resolved)),
        };

        let status = response.status();
        let headers = collect_headers(response.headers());

        let mut body = Vec::new();
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => body.extend_from_slice(&chunk),
                Ok(None) => break,
                Err(e) => {
                    return CallOutcome::Failure(
                        failure_from(&e, resolved)
                            .with_status(status.as_u16())
                            .with_partial_body(body),
                    );
                }
            }
        }

        let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        debug!(status = status.as_u16(), latency_ms, bytes = body.len(), "upstream exchange complete");

        CallOutcome::Success(UpstreamResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Options => Method::OPTIONS,
    }
}

/// Flatten response headers; repeated names are joined with `", "`.
fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        match out.entry(name.as_str().to_string()) {
            Entry::Occupied(mut e) => {
                let joined: &mut String = e.get_mut();
                joined.push_str(", ");
                joined.push_str(&value);
            }
            Entry::Vacant(e) => {
                e.insert(value.into_owned());
            }
        }
    }
    out
}

fn failure_from(err: &reqwest::Error, resolved: &ResolvedAddress) -> TransportFailure {
    TransportFailure::new(failure_kind(err), error_chain(err), resolved.as_str())
}

fn failure_kind(err: &reqwest::Error) -> FailureKind {
    if err.is_timeout() {
        return FailureKind::Timeout;
    }
    if err.is_connect() {
        let mut source = err.source();
        while let Some(cause) = source {
            if let Some(io_err) = cause.downcast_ref::<io::Error>() {
                match io_err.kind() {
                    io::ErrorKind::ConnectionRefused => return FailureKind::ConnectionRefused,
                    io::ErrorKind::TimedOut => return FailureKind::Timeout,
                    _ => {}
                }
            }
            source = cause.source();
        }

        let chain = error_chain(err).to_ascii_lowercase();
        if ["dns error", "failed to lookup address", "name or service not known", "no such host"]
            .iter()
            .any(|needle| chain.contains(needle))
        {
            return FailureKind::HostNotFound;
        }
        return FailureKind::Connect;
    }
    if err.is_body() || err.is_decode() {
        return FailureKind::Body;
    }
    FailureKind::Request
}

/// `err` followed by each of its sources, separated by `": "`.
fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
