//! # Fanout
//!
//! `fanout` is an in-process publish/subscribe core: a registry of
//! subscribers for one publisher that stays consistent while subscribers come
//! and go, including from inside a notification pass.
//!
//! ## Core Modules
//!
//! - `registry`: the subscriber registry, subscription handles, synchronous and
//!   asynchronous fan-out, and per-publish delivery reports.
//! - `subscriber`: the one-method `Subscriber` capability a receiver implements.
//! - `config`: loads registry and logging settings from file and environment.
//! - `utils`: error types and logging bootstrap.
//!
//! ## Example
//!
//! ```rust
//! use fanout::{Registry, UpdateResult};
//!
//! let registry: Registry<String> = Registry::new();
//! let handle = registry
//!     .subscribe(|msg: &String| -> UpdateResult {
//!         println!("got {msg}");
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! let report = registry.publish("hello".to_string()).unwrap();
//! assert_eq!(report.delivered(), vec![handle.id()]);
//! ```

pub mod config;
pub mod registry;
pub mod subscriber;
pub mod utils;

pub use registry::{
    DeliveryReport, HandleState, PendingDelivery, Registry, SubscriberHandle, SubscriberId,
};
pub use subscriber::{Subscriber, UpdateResult, named};
pub use utils::error::{DeliveryError, DeliveryErrorKind, RegistryError};
