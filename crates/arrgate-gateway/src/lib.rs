//! `arrgate-gateway`: the arrgate request gateway runtime.
//!
//! A browser client cannot reach media services that only listen on the
//! operator's LAN or on the host's loopback interface. The gateway accepts a
//! description of the call over `POST /proxy`, rewrites loopback targets when
//! it runs inside a container, performs the call with a fixed timeout and
//! answers with either the upstream's response or a classified diagnosis.
//!
//! | Kernel contract | Implementation |
//! |----------------|----------------|
//! | [`AddressResolver`](arrgate_kernel::gateway::AddressResolver) | used as-is, fixed at startup |
//! | call execution | [`backend::Transport`], [`backend::HttpTransport`] |
//! | failure diagnosis | [`backend::FailureClassifier`] |
//!
//! # Quick start
//!
//! ```rust,no_run
//! use arrgate_gateway::server::GatewayServer;
//! use arrgate_kernel::config::GatewaySettings;
//!
//! #[tokio::main]
//! async fn main() {
//!     let settings = GatewaySettings {
//!         isolated: true,
//!         ..Default::default()
//!     };
//!     let server = GatewayServer::new(settings).unwrap();
//!     server.start().await.unwrap();
//! }
//! ```

pub mod backend;
pub mod error;
pub mod handlers;
pub mod server;
pub mod state;

// Re-export the kernel gateway types for convenience.
pub use arrgate_kernel::gateway;
