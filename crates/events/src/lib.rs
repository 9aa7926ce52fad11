//! In-process pub/sub for analysis lifecycle events.

pub mod bus;

pub use bus::{AnalysisEvent, EventBus};
