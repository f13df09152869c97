//! # Event System
//!
//! Publish/subscribe delivery of job events to listener contexts.

pub mod publisher;
pub mod subscription;

pub use publisher::EventPublisher;
pub use subscription::{ListenerId, Subscription, Topic};
