//! The `subscriber` module defines what it takes to receive published messages.
//!
//! A subscriber is any value exposing the single [`Subscriber::update`]
//! operation. Closures qualify through a blanket implementation; [`named`]
//! attaches a readable label to one for logs and delivery reports.

pub mod subscriber;

pub use subscriber::{Named, Subscriber, UpdateResult, named};
