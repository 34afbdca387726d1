//! `partsbin-observability` — process-wide tracing setup.

mod subscriber;

pub use subscriber::init;
