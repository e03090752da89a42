//! Kernel error types.
//!
//! [`KernelError`] covers every failure that can be detected *before* any
//! network I/O occurs: malformed call descriptions and invalid settings.
//! Transport failures (connection refused, upstream timeout, …) are not
//! errors at this level; they are values of
//! [`TransportFailure`](super::types::TransportFailure).

use thiserror::Error;

/// Validation and configuration error type for the gateway kernel.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum KernelError {
    // ── Call validation ──────────────────────────────────────────────────────
    /// The call description has no `url`, or it is blank.
    #[error("URL is required")]
    MissingTarget,

    /// The `method` field is not a verb the gateway relays.
    #[error("unsupported HTTP method '{0}'")]
    UnsupportedMethod(String),

    /// A forwarded header name or value cannot be sent on the wire.
    #[error("invalid header '{0}'")]
    InvalidHeader(String),

    // ── Settings ─────────────────────────────────────────────────────────────
    /// `request_timeout_ms` is zero, which would fail every call.
    #[error("request timeout must be greater than 0 ms")]
    InvalidTimeout,

    /// The bridge hostname used in isolated mode is empty.
    #[error("bridge host cannot be empty")]
    EmptyBridgeHost,
}
