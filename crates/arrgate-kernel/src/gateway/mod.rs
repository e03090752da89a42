//! Request gateway kernel contract.
//!
//! This module defines the *types and pure functions* behind the single
//! `POST /proxy` operation. Concrete transport and HTTP serving live in
//! `arrgate-gateway`.
//!
//! # Architecture mapping
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              arrgate-kernel  (this module)                  │
//! │  CallRequest / RawCallRequest    HttpMethod                 │
//! │  AddressResolver + NetworkMode   host predicates            │
//! │  CallOutcome / UpstreamResponse / TransportFailure          │
//! │  KernelError                                                │
//! └──────────────────────────┬──────────────────────────────────┘
//!                            │  depends on
//! ┌──────────────────────────▼──────────────────────────────────┐
//! │              arrgate-gateway  (runtime crate)               │
//! │  Transport trait + HttpTransport (reqwest)                  │
//! │  FailureClassifier → Diagnosis                              │
//! │  GatewayServer  (axum HTTP server)                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```rust
//! use arrgate_kernel::gateway::{AddressResolver, NetworkMode};
//!
//! let resolver = AddressResolver::new(NetworkMode::Isolated);
//! let resolved = resolver.resolve("http://localhost:8989/api");
//! assert_eq!(resolved.as_str(), "http://host.docker.internal:8989/api");
//! ```

pub mod address;
pub mod error;
pub mod types;
pub mod validation;

// ── Flat re-exports ────────────────────────────────────────────────────────

pub use address::{
    AddressResolver, DEFAULT_BRIDGE_HOST, HostClass, NetworkMode, ResolvedAddress,
    classify_host, classify_target, is_loopback_host, is_private_ipv4,
};
pub use error::KernelError;
pub use types::{
    CallOutcome, CallRequest, FailureKind, HttpMethod, TransportFailure, UpstreamResponse,
};
pub use validation::{RawCallRequest, normalize_base_url};
