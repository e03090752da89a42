//! Transport failure diagnosis.
//!
//! Turns a [`TransportFailure`] into the status code and operator-facing
//! message returned by the gateway. First match wins:
//!
//! | Failure | Status | Message |
//! |---------|--------|---------|
//! | refused / host not found | `502` | "could not connect", plus a loopback note or a private-network checklist depending on the caller's original target |
//! | timeout | `504` | upstream did not answer in time |
//! | anything else | the upstream error status already received (`4xx`/`5xx`), else `500` | none; `error` carries the transport message |

use arrgate_kernel::gateway::{FailureKind, HostClass, TransportFailure, classify_target};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;

const CONNECT_FAILED: &str = "Could not connect to the service.";

const LOOPBACK_NOTE: &str = " The gateway cannot reach your localhost address from its network. \
     Please ensure the service is running on your host machine.";

const TIMEOUT_MESSAGE: &str = "The request timed out. This may happen if the service is not \
     accessible from the gateway.";

/// Structured diagnosis of a failed call.
///
/// Serialises to the `{ error, code, data, message? }` envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnosis {
    /// HTTP status the gateway answers with.
    #[serde(skip)]
    pub status: u16,
    /// Underlying transport message, unmodified.
    pub error: String,
    /// Stable error code, e.g. `ECONNREFUSED`.
    pub code: &'static str,
    /// Whatever body the upstream sent before the failure, or `null`.
    pub data: Option<Value>,
    /// Remediation hint for the operator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Stateless failure classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailureClassifier;

impl FailureClassifier {
    /// Diagnose `failure`. `original_target` is the URL the caller asked for,
    /// before any rewrite; remediation hints are phrased in its terms.
    pub fn classify(failure: &TransportFailure, original_target: &str) -> Diagnosis {
        let (status, message) = match failure.kind {
            kind if kind.is_unreachable() => {
                (502, Some(unreachable_message(original_target)))
            }
            FailureKind::Timeout => (504, Some(TIMEOUT_MESSAGE.to_string())),
            _ => (
                failure
                    .status
                    .filter(|s| (400..=599).contains(s))
                    .unwrap_or(500),
                None,
            ),
        };

        Diagnosis {
            status,
            error: failure.message.clone(),
            code: failure.kind.code(),
            data: failure.partial_data(),
            message,
        }
    }
}

fn unreachable_message(original_target: &str) -> String {
    match classify_target(original_target) {
        HostClass::Loopback => format!("{CONNECT_FAILED}{LOOPBACK_NOTE}"),
        HostClass::Private => format!(
            "{CONNECT_FAILED} Could not connect to {original_target}. Please verify:\n\
             \x20 1. The service is running on that IP\n\
             \x20 2. The port is correct and open\n\
             \x20 3. Any firewalls allow the connection\n\
             \x20 4. The gateway has network access to that IP"
        ),
        HostClass::Public => CONNECT_FAILED.to_string(),
    }
}

impl IntoResponse for Diagnosis {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}
