//! Relay endpoint
//!
//! POST /proxy - perform an outbound HTTP call on the caller's behalf
//!
//! The call runs through `Received → Validated → Resolved → Executed` and
//! ends either `Relayed` (the upstream answered, whatever its status) or
//! `Diagnosed` (no complete exchange). Validation failures are the only path that never
//! reaches the network.

use arrgate_kernel::gateway::{
    CallOutcome, CallRequest, KernelError, RawCallRequest, UpstreamResponse,
};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderName, HeaderValue},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::backend::FailureClassifier;
use crate::error::GatewayError;
use crate::state::AppState;

/// Body returned with `200 OK` whenever the upstream answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayEnvelope {
    /// Upstream status code, relayed verbatim.
    pub status: u16,
    pub status_text: String,
    pub data: Value,
    pub headers: BTreeMap<String, String>,
}

impl From<UpstreamResponse> for RelayEnvelope {
    fn from(resp: UpstreamResponse) -> Self {
        let data = resp.data();
        Self {
            status: resp.status,
            status_text: resp.status_text,
            data,
            headers: resp.headers,
        }
    }
}

/// POST /proxy
#[instrument(name = "proxy", skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn proxy(
    State(state): State<AppState>,
    payload: Result<Json<RawCallRequest>, JsonRejection>,
) -> Result<Response, GatewayError> {
    info!("proxy request received");

    // Validated
    let Json(raw) = payload.inspect_err(|e| warn!(error = %e.body_text(), "rejected malformed call"))?;
    let call = CallRequest::try_from(raw).inspect_err(|e| warn!(error = %e, "rejected call"))?;
    validate_headers(&call).inspect_err(|e| warn!(error = %e, "rejected call"))?;

    info!(method = %call.method, target = %call.target, "proxy call validated");

    // Resolved
    let resolved = state.resolver.resolve(&call.target);
    if resolved.is_rewritten() {
        info!(
            target = %call.target,
            resolved = %resolved,
            bridge = state.resolver.bridge_host(),
            "rewrote loopback target for isolated network"
        );
    } else {
        debug!(resolved = %resolved, mode = ?state.resolver.mode(), "dialing target as-is");
    }

    // Executed
    let start = Instant::now();
    let outcome = state.transport.execute(&call, &resolved, state.timeout).await;
    let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

    match outcome {
        CallOutcome::Success(resp) => {
            info!(resolved = %resolved, status = resp.status, latency_ms, "proxy response relayed");
            Ok(Json(RelayEnvelope::from(resp)).into_response())
        }
        CallOutcome::Failure(failure) => {
            let diagnosis = FailureClassifier::classify(&failure, &call.target);
            error!(
                resolved = %failure.attempted,
                kind = ?failure.kind,
                code = diagnosis.code,
                status = diagnosis.status,
                latency_ms,
                error = %failure.message,
                "proxy call failed"
            );
            Ok(diagnosis.into_response())
        }
    }
}

/// Reject headers that could never be put on the wire.
fn validate_headers(call: &CallRequest) -> Result<(), KernelError> {
    for (name, value) in &call.headers {
        if HeaderName::from_bytes(name.as_bytes()).is_err() || HeaderValue::from_str(value).is_err()
        {
            return Err(KernelError::InvalidHeader(name.clone()));
        }
    }
    Ok(())
}
