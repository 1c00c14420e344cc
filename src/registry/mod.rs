//! The `registry` module is the publish/subscribe core.
//!
//! A publisher owns one [`Registry`]. Subscribers join with
//! [`Registry::subscribe`] and leave by unsubscribing or dropping their
//! [`SubscriberHandle`]. [`Registry::publish`] delivers to the subscribers
//! active when it was called and reports per-subscriber outcomes.

pub mod dispatch;
pub mod engine;
pub mod handle;
pub mod message;
pub mod report;

pub use dispatch::PendingDelivery;
pub use engine::Registry;
pub use handle::{HandleState, SubscriberHandle, SubscriberId};
pub use message::Retained;
pub use report::{Delivery, DeliveryReport, Outcome};
