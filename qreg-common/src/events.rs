//! Event types for the QReg registration workflow
//!
//! User-visible notices (analysis progress, registration outcomes, resets)
//! are broadcast as `RegistrationEvent` via the EventBus. The embedding UI
//! subscribes and renders the notices; tests subscribe and assert on them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Registration workflow event types
///
/// Events are broadcast via EventBus and can be serialized for transmission
/// to an attached UI. All variants carry the originating workflow session
/// and a timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RegistrationEvent {
    /// An image was selected and a local preview created
    ImageCaptured {
        session_id: Uuid,
        /// Name of the selected file
        file_name: String,
        timestamp: DateTime<Utc>,
    },

    /// Image upload and remote analysis started
    AnalysisStarted {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// Remote analysis finished successfully
    AnalysisCompleted {
        session_id: Uuid,
        /// Number of similar catalog products proposed by the backend
        candidate_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// Remote analysis failed; the captured image is retained for retry
    AnalysisFailed {
        session_id: Uuid,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// A new product was registered and assigned a Q-CODE
    ProductRegistered {
        session_id: Uuid,
        qcode: String,
        timestamp: DateTime<Utc>,
    },

    /// Registration or candidate confirmation failed; state retained for retry
    RegistrationFailed {
        session_id: Uuid,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// The capture was matched to an existing catalog product
    CandidateConfirmed {
        session_id: Uuid,
        qcode: String,
        timestamp: DateTime<Utc>,
    },

    /// The workflow returned to its initial state
    WorkflowReset {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
    },
}

/// Broadcast bus for registration events
///
/// Thin wrapper over `tokio::sync::broadcast`. Emission is best-effort: an
/// event sent while no subscriber is attached is dropped silently.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<RegistrationEvent>,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    ///
    /// Old events are dropped once the buffer fills; slow subscribers
    /// observe a `Lagged` error from the receiver.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<RegistrationEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns the number of subscribers that received the event.
    pub fn emit(&self, event: RegistrationEvent) -> usize {
        match self.tx.send(event) {
            Ok(count) => count,
            // No subscribers attached; notices are best-effort
            Err(_) => 0,
        }
    }

    /// Number of currently attached subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
