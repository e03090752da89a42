//! `arrgate-kernel`: contract types and pure logic for the arrgate request
//! gateway.
//!
//! Nothing in this crate performs network I/O. The runtime crate
//! (`arrgate-gateway`) builds on these types to execute calls.

// gateway contract module
pub mod gateway;
pub use gateway::*;

// settings module
#[cfg(feature = "config")]
pub mod config;
