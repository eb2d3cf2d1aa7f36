//! # Store Bridge Traits
//!
//! Capability traits that must be implemented by the native App Store layer.
//!
//! ## Overview
//!
//! This crate defines the contract between the purchase core and the
//! platform-specific billing implementation. Each trait represents one
//! capability of the native store that the core consumes but does not define:
//!
//! - [`PaymentQueue`](queue::PaymentQueue) - The serialized transaction queue
//! - [`TransactionObserver`](queue::TransactionObserver) - Transaction-state callbacks
//! - [`ProductsRequester`](products::ProductsRequester) - Product metadata requests
//! - [`ReceiptStore`](receipt::ReceiptStore) - App Store receipt access and refresh
//! - [`SystemInfo`](system::SystemInfo) - Host OS version string
//! - [`Clock`](system::Clock) - Time source for deterministic testing
//! - [`PriceFormatter`](system::PriceFormatter) - Locale-aware price display
//!
//! ## Delivery guarantees
//!
//! The native payment queue serializes transaction-state delivery: observer
//! callbacks for one queue never run concurrently. The purchase core relies on
//! this as a correctness precondition. Asynchronous requests (product info,
//! receipt refresh) are one-shot continuations with no cancellation and no
//! timeout; a stalled native request simply never completes.
//!
//! ## Error Handling
//!
//! Native failures are reported as [`StoreError`](error::StoreError) values
//! carrying the platform error code and localized description. Implementations
//! should preserve the platform's cancellation code so the core can
//! distinguish user-initiated aborts from real failures.

pub mod error;
pub mod products;
pub mod queue;
pub mod receipt;
pub mod system;

pub use error::{StoreError, PAYMENT_CANCELLED_CODE};
pub use products::{
    PriceLocale, ProductDiscount, ProductsRequester, StorePeriodUnit, StoreProduct,
    SubscriptionPeriod,
};
pub use queue::{
    ObserverHandle, Payment, PaymentQueue, PaymentTransaction, TransactionObserver,
    TransactionState,
};
pub use receipt::ReceiptStore;
pub use system::{Clock, LocalePriceFormatter, PriceFormatter, SystemClock, SystemInfo};
