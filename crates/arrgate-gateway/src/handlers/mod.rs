//! Request handlers for the gateway API

pub mod health;
pub mod proxy;

pub use health::health;
pub use proxy::{RelayEnvelope, proxy};
