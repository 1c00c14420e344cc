//! The `utils` module provides definitions shared across the `fanout` crate.
//!
//! It centralizes the error types returned by the registry and the logging
//! bootstrap used by the demo binary and by tests.

pub mod error;
pub mod logging;

pub use error::{BoxError, DeliveryError, DeliveryErrorKind, RegistryError};
