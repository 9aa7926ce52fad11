//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`AnalysisEvent`]s.
//! It is designed to be shared via `Arc<EventBus>` between the service
//! facade and the worker.

use chrono::{DateTime, Utc};
use mealscan_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// AnalysisEvent
// ---------------------------------------------------------------------------

/// A lifecycle event emitted by the pipeline.
///
/// Constructed via [`AnalysisEvent::new`] and enriched with the builder
/// methods [`with_job`](AnalysisEvent::with_job) and
/// [`with_payload`](AnalysisEvent::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisEvent {
    /// Dot-separated event name, e.g. `"analysis.completed"`.
    pub event_type: String,

    /// Job the event refers to, when applicable.
    pub job_id: Option<DbId>,

    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl AnalysisEvent {
    /// Well-known event names.
    pub const JOB_SUBMITTED: &'static str = "job.submitted";
    pub const ANALYSIS_COMPLETED: &'static str = "analysis.completed";
    pub const ANALYSIS_FAILED: &'static str = "analysis.failed";
    pub const RESULT_RECONCILED: &'static str = "result.reconciled";

    /// Create a new event with only the required `event_type`.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            job_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Attach the job the event refers to.
    pub fn with_job(mut self, job_id: DbId) -> Self {
        self.job_id = Some(job_id);
        self
    }

    /// Set the JSON payload for the event.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`AnalysisEvent`].
pub struct EventBus {
    sender: broadcast::Sender<AnalysisEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are
    /// dropped and slow receivers observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently
    /// dropped; events are advisory and never load-bearing.
    pub fn publish(&self, event: AnalysisEvent) {
        tracing::debug!(event_type = %event.event_type, job_id = ?event.job_id, "event");
        // Ignore the SendError — it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<AnalysisEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
