//! # Core Purchase
//!
//! Apple App Store purchase adapter for the purchase platform core.
//!
//! ## Overview
//!
//! This crate bridges the store-agnostic purchase lifecycle to the native
//! App Store billing capabilities defined in `store-traits`. It owns the
//! install/purchase/restore state machine, maps native transactions and
//! products into the store-agnostic model, and reports every outcome through
//! the caller's [`PurchaseObserver`](observer::PurchaseObserver).
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐ install/purchase ┌──────────────────────┐  requests   ┌──────────────┐
//! │ Host caller  ├─────────────────>│ AppStorePurchase-    ├────────────>│ Native store │
//! │ (observer)   │<─────────────────┤ Manager              │<────────────┤ capabilities │
//! └──────────────┘  handle_* calls  │  ├─ VersionProbe     │  callbacks  └──────────────┘
//!                                   │  ├─ TransactionMapper│
//!                                   │  └─ PromotionObserver│
//!                                   └──────────────────────┘
//! ```
//!
//! The manager issues a product-info request on install, swaps a minimal
//! promotion placeholder for the full transaction observer once metadata is
//! available, and then drives every transaction-state callback through the
//! mapper and out to the caller.
//!
//! ## Concurrency
//!
//! The native payment queue serializes callback delivery, so the manager is a
//! single logical actor. Internal state sits behind `tokio::sync` locks; they
//! only bridge Rust's aliasing rules, there is no cross-thread contention.

pub mod config;
pub mod error;
pub mod manager;
pub mod mapper;
pub mod observer;
pub mod types;
pub mod version;

pub use config::{Offer, OfferType, PurchaseConfig, STORE_NAME_APPLE};
pub use error::{PurchaseError, Result};
pub use manager::{AppStorePurchaseManager, ManagerOptions};
pub use mapper::TransactionMapper;
pub use observer::{AcceptAllPromotions, PromotionObserver, PromotionPolicy, PurchaseObserver};
pub use types::{FreeTrialPeriod, Information, PeriodUnit, Transaction};
pub use version::{OsVersion, VersionProbe};
