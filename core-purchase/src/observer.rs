//! Caller-facing observer interface and the promotion placeholder observer.

use std::sync::Arc;

use async_trait::async_trait;
use store_traits::{Payment, StoreProduct, TransactionObserver};

use crate::error::PurchaseError;
use crate::types::Transaction;

/// Purchase lifecycle callbacks implemented by the surrounding application.
///
/// Every outcome of the manager is reported through exactly one of these
/// callbacks; nothing is thrown past the manager boundary except programmer
/// misuse, which panics.
#[async_trait]
pub trait PurchaseObserver: Send + Sync {
    /// The manager finished installing and is ready to take purchases.
    async fn handle_install(&self);

    /// Installation failed; the manager stays uninstalled.
    async fn handle_install_error(&self, error: PurchaseError);

    /// A purchase completed and was finished with the store.
    async fn handle_purchase(&self, transaction: Transaction);

    /// A purchase failed.
    async fn handle_purchase_error(&self, error: PurchaseError);

    /// The user cancelled a purchase or restore flow.
    async fn handle_purchase_canceled(&self);

    /// A restore flow completed; the batch holds every restored
    /// transaction, in delivery order.
    async fn handle_restore(&self, transactions: Vec<Transaction>);

    /// A restore flow failed.
    async fn handle_restore_error(&self, error: PurchaseError);
}

/// Decides whether a store-initiated promotional payment should be
/// processed. Replaces the original design's subclass override point with an
/// injected policy.
pub trait PromotionPolicy: Send + Sync {
    fn should_process(&self, payment: &Payment, product: &StoreProduct) -> bool;
}

/// Default policy: enqueue the promotional payment and process it as soon as
/// product information is available.
#[derive(Debug, Clone, Default)]
pub struct AcceptAllPromotions;

impl PromotionPolicy for AcceptAllPromotions {
    fn should_process(&self, _payment: &Payment, _product: &StoreProduct) -> bool {
        true
    }
}

/// Placeholder observer installed right after startup.
///
/// Promotional purchases must be answered before product metadata has been
/// fetched, so this minimal observer sits on the queue until the full
/// transaction observer is ready. It overrides only the promotional-payment
/// gate; every other callback keeps the neutral default.
pub struct PromotionObserver {
    policy: Arc<dyn PromotionPolicy>,
}

impl PromotionObserver {
    pub fn new(policy: Arc<dyn PromotionPolicy>) -> Self {
        Self { policy }
    }
}

#[async_trait]
impl TransactionObserver for PromotionObserver {
    async fn should_add_store_payment(&self, payment: &Payment, product: &StoreProduct) -> bool {
        self.policy.should_process(payment, product)
    }
}
