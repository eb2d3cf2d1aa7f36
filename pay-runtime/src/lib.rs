//! # Purchase Runtime
//!
//! Ambient runtime infrastructure for the purchase platform core:
//!
//! - [`events`] - Typed purchase event bus over a broadcast channel
//! - [`logging`] - `tracing` subscriber configuration
//! - [`error`] - Runtime error type
//!
//! Events mirror the purchase lifecycle for host-side observability and are
//! strictly additive: the authoritative caller interface is the purchase
//! observer callback trait in `core-purchase`.

pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
pub use events::{EventBus, EventSeverity, PurchaseEvent, DEFAULT_EVENT_BUFFER_SIZE};
pub use logging::{init_logging, LogFormat, LoggingConfig};
