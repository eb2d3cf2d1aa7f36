//! App Store Receipt Access
//!
//! The store keeps a single application receipt on disk. When a purchased
//! transaction carries no usable signature, the core reads this receipt and,
//! if it is missing, asks the store to refresh it once.

use async_trait::async_trait;

use crate::error::StoreError;

/// Receipt access capability.
#[async_trait]
pub trait ReceiptStore: Send + Sync {
    /// The application receipt currently on local storage, if present.
    async fn app_store_receipt(&self) -> Option<Vec<u8>>;

    /// Ask the store to fetch a fresh application receipt.
    ///
    /// One-shot, best effort. Completion does not guarantee that
    /// [`app_store_receipt`](Self::app_store_receipt) returns data afterwards.
    async fn refresh_receipt(&self) -> Result<(), StoreError>;
}
