//! Backend module.

mod classifier;
mod transport;

pub use classifier::{Diagnosis, FailureClassifier};
pub use transport::{HttpTransport, Transport};
