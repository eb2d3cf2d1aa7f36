//! # Purchase Event Bus
//!
//! Event-driven observability for the purchase core using
//! `tokio::sync::broadcast`. The manager mirrors lifecycle milestones onto
//! this bus so hosts can log or display purchase progress without sitting in
//! the observer callback path.
//!
//! ## Usage
//!
//! ```rust
//! use pay_runtime::events::{EventBus, PurchaseEvent};
//!
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! event_bus.emit(PurchaseEvent::Installing).ok();
//! ```
//!
//! ## Error Handling
//!
//! `emit` fails only when no subscriber is attached; emitters treat that as
//! non-fatal. Subscribers that fall behind receive `RecvError::Lagged` and can
//! keep receiving newer events.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Purchase flows are low-volume; a small buffer is plenty while still
/// absorbing a burst of restored transactions.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

/// Purchase lifecycle events published through the event bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PurchaseEvent {
    /// Manager installation started.
    Installing,
    /// Manager installed and the full transaction observer is active.
    Installed {
        /// Number of products returned by the initial metadata request.
        product_count: usize,
    },
    /// Installation failed; the manager stays uninstalled.
    InstallFailed {
        /// Human-readable failure message.
        message: String,
    },
    /// A purchase was delivered to the caller.
    PurchaseCompleted {
        /// Store-agnostic identifier of the purchased offer.
        identifier: String,
        /// Stable order identifier, when the store provided one.
        order_id: Option<String>,
    },
    /// A purchase failed.
    PurchaseFailed {
        /// Human-readable failure message.
        message: String,
    },
    /// The user cancelled a purchase or restore flow.
    PurchaseCanceled,
    /// A restore flow finished and its batch was delivered.
    RestoreCompleted {
        /// Number of restored transactions in the batch.
        count: usize,
    },
    /// A restore flow failed.
    RestoreFailed {
        /// Human-readable failure message.
        message: String,
    },
}

impl PurchaseEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            PurchaseEvent::Installing => "Purchase manager installing",
            PurchaseEvent::Installed { .. } => "Purchase manager installed",
            PurchaseEvent::InstallFailed { .. } => "Purchase manager install failed",
            PurchaseEvent::PurchaseCompleted { .. } => "Purchase completed",
            PurchaseEvent::PurchaseFailed { .. } => "Purchase failed",
            PurchaseEvent::PurchaseCanceled => "Purchase cancelled by user",
            PurchaseEvent::RestoreCompleted { .. } => "Restore completed",
            PurchaseEvent::RestoreFailed { .. } => "Restore failed",
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            PurchaseEvent::InstallFailed { .. }
            | PurchaseEvent::PurchaseFailed { .. }
            | PurchaseEvent::RestoreFailed { .. } => EventSeverity::Error,
            PurchaseEvent::Installed { .. }
            | PurchaseEvent::PurchaseCompleted { .. }
            | PurchaseEvent::RestoreCompleted { .. } => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

/// Central broadcast channel for purchase events.
///
/// Cloning the bus is cheap; all clones share the same channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PurchaseEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error when no subscriber is attached.
    pub fn emit(
        &self,
        event: PurchaseEvent,
    ) -> Result<usize, SendError<PurchaseEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscription to the event stream.
    pub fn subscribe(&self) -> Receiver<PurchaseEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}
