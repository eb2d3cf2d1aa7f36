//! Payment Queue and Transaction Observer Capabilities
//!
//! The payment queue is the store's serialized transaction pipeline. The core
//! enqueues payments and restore requests on it and receives transaction-state
//! callbacks through a registered [`TransactionObserver`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::error::StoreError;
use crate::products::StoreProduct;

/// A payment enqueued for a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment {
    /// Store-specific identifier of the product being bought.
    pub product_identifier: String,
    /// Opaque request payload attached by the caller, if any.
    pub request_data: Option<Vec<u8>>,
}

impl Payment {
    pub fn new(product_identifier: impl Into<String>) -> Self {
        Self {
            product_identifier: product_identifier.into(),
            request_data: None,
        }
    }
}

/// State of a transaction in the payment queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Payment is being processed by the store.
    Purchasing,
    /// Payment succeeded.
    Purchased,
    /// Payment failed or was cancelled.
    Failed,
    /// A previously completed purchase was restored.
    Restored,
    /// Payment is awaiting external approval (e.g. Ask to Buy).
    Deferred,
}

/// A transaction delivered by the payment queue.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentTransaction {
    /// Queue-assigned identifier. Absent while the transaction is in flight.
    pub transaction_identifier: Option<String>,
    pub state: TransactionState,
    /// The payment this transaction settles.
    pub payment: Payment,
    /// When the store recorded the transaction.
    pub transaction_date: Option<DateTime<Utc>>,
    /// Identifier of the first purchase in a restore chain. Absent for
    /// first-time purchases; restores get a fresh working identifier but
    /// keep this one stable.
    pub original_transaction_identifier: Option<String>,
    /// Failure cause, set when `state` is [`TransactionState::Failed`].
    pub error: Option<StoreError>,
    /// Deprecated per-transaction receipt. Best effort; newer OS versions
    /// may not populate it.
    pub transaction_receipt: Option<Vec<u8>>,
}

impl PaymentTransaction {
    pub fn new(state: TransactionState, payment: Payment) -> Self {
        Self {
            transaction_identifier: None,
            state,
            payment,
            transaction_date: None,
            original_transaction_identifier: None,
            error: None,
            transaction_receipt: None,
        }
    }
}

/// Handle returned when an observer is registered on the payment queue.
///
/// Used to remove exactly the observer that was added, since several
/// observers may be installed over the manager's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverHandle(pub u64);

/// Transaction-observer capability set.
///
/// Every callback has a neutral default body (no-op, or `false` for the
/// promotional-payment gate), so an implementor can override only the
/// callbacks it cares about. This is how a minimal placeholder observer is
/// installed early, before the full transaction flow is ready.
#[async_trait]
pub trait TransactionObserver: Send + Sync {
    /// One or more transactions changed state. Called repeatedly for every
    /// transaction currently in the queue.
    async fn updated_transactions(&self, transactions: Vec<PaymentTransaction>) {
        let _ = transactions;
    }

    /// Transactions were removed from the queue after being finished.
    async fn removed_transactions(&self, transactions: Vec<PaymentTransaction>) {
        let _ = transactions;
    }

    /// The restore flow finished; every restorable transaction has been
    /// delivered through [`updated_transactions`](Self::updated_transactions).
    async fn restore_completed(&self) {}

    /// The restore flow failed before completing.
    async fn restore_failed(&self, error: StoreError) {
        let _ = error;
    }

    /// A store-initiated promotional payment is about to be enqueued.
    /// Return `true` to let the queue process it.
    async fn should_add_store_payment(&self, payment: &Payment, product: &StoreProduct) -> bool {
        let _ = (payment, product);
        false
    }

    /// The store revoked entitlements for the given product identifiers.
    async fn did_revoke_entitlements(&self, product_identifiers: Vec<String>) {
        let _ = product_identifiers;
    }
}

/// The store's payment queue.
///
/// Implementations wrap the platform's singleton queue. Transaction-state
/// delivery to observers is serialized by the platform; the core relies on
/// that guarantee instead of locking around callback re-entry.
#[async_trait]
pub trait PaymentQueue: Send + Sync {
    /// Whether this device is allowed to make payments at all.
    fn can_make_payments(&self) -> bool;

    /// Enqueue a payment for processing.
    async fn add_payment(&self, payment: Payment);

    /// Mark a transaction as handled so the queue stops redelivering it.
    async fn finish_transaction(&self, transaction: &PaymentTransaction);

    /// Ask the store to redeliver completed, non-consumed purchases.
    async fn restore_completed_transactions(&self);

    /// Transactions currently sitting in the queue (e.g. completed while no
    /// full observer was installed).
    async fn pending_transactions(&self) -> Vec<PaymentTransaction>;

    /// Register an observer for transaction-state callbacks.
    async fn add_observer(&self, observer: Arc<dyn TransactionObserver>) -> ObserverHandle;

    /// Remove a previously registered observer.
    async fn remove_observer(&self, handle: ObserverHandle);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopObserver;

    impl TransactionObserver for NoopObserver {}

    #[tokio::test]
    async fn default_observer_rejects_promotional_payments() {
        let observer = NoopObserver;
        let payment = Payment::new("com.example.gold");
        let product = StoreProduct {
            product_identifier: "com.example.gold".to_string(),
            localized_title: "Gold".to_string(),
            localized_description: "A pile of gold".to_string(),
            price: 0.99,
            price_locale: crate::products::PriceLocale::new("USD", "$"),
            introductory_price: None,
        };
        assert!(!observer.should_add_store_payment(&payment, &product).await);
    }

    #[tokio::test]
    async fn default_observer_callbacks_are_noops() {
        let observer = NoopObserver;
        let tx = PaymentTransaction::new(TransactionState::Purchasing, Payment::new("p"));
        observer.updated_transactions(vec![tx.clone()]).await;
        observer.removed_transactions(vec![tx]).await;
        observer.restore_completed().await;
        observer.restore_failed(StoreError::cancelled()).await;
        observer.did_revoke_entitlements(vec!["p".to_string()]).await;
    }
}
