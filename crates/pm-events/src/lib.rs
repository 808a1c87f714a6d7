//! # pm-events: Patient Event Publication
//!
//! [`EventPublisher::publish`] is synchronous and never reports failure to
//! its caller. Delivery is best effort: the broker implementation runs one
//! attempt on a background task and logs whatever goes wrong.

pub mod config;
pub mod publisher;

pub use config::{BrokerConfig, ConfigError};
pub use publisher::{
    EventPublisher, HttpBrokerPublisher, InMemoryPublisher, LoggingPublisher, PublishError,
};
