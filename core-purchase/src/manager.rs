//! # App Store Purchase Manager
//!
//! Orchestrates the install/purchase/restore lifecycle against the native
//! store capabilities.
//!
//! ## Lifecycle
//!
//! ```text
//! uninstalled ──install()──> installing ──products received──> installed
//!      ^                        │
//!      └──product fetch failed──┘        (restoring is a sub-flow of
//!                                         installed, driven by the queue)
//! ```
//!
//! `install` checks the device payment capability, parks a minimal promotion
//! observer on the queue, and fetches product metadata for every configured
//! offer. Once metadata arrives the placeholder is swapped for the full
//! observer (the manager itself), the caller is notified, and transactions
//! already sitting in the queue are re-driven so purchases made before the
//! manager was ready are not lost.
//!
//! ## Usage
//!
//! ```no_run
//! use core_purchase::{
//!     AppStorePurchaseManager, Offer, OfferType, PurchaseConfig, STORE_NAME_APPLE,
//! };
//! use pay_runtime::events::EventBus;
//! # use std::sync::Arc;
//! # use core_purchase::PurchaseObserver;
//! # async fn run(
//! #     queue: Arc<dyn store_traits::PaymentQueue>,
//! #     requester: Arc<dyn store_traits::ProductsRequester>,
//! #     receipts: Arc<dyn store_traits::ReceiptStore>,
//! #     system: Arc<dyn store_traits::SystemInfo>,
//! #     observer: Arc<dyn PurchaseObserver>,
//! # ) {
//! let manager = AppStorePurchaseManager::new(queue, requester, receipts, system, EventBus::default());
//!
//! let config = PurchaseConfig::new().with_offer(
//!     Offer::new("gold_pack", OfferType::Consumable)
//!         .with_store_identifier(STORE_NAME_APPLE, "com.example.gold"),
//! );
//! manager.install(observer, config, true).await;
//! # }
//! ```

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, instrument, warn};

use pay_runtime::events::{EventBus, PurchaseEvent};
use store_traits::{
    Clock, LocalePriceFormatter, ObserverHandle, Payment, PaymentQueue, PaymentTransaction,
    PriceFormatter, ProductsRequester, ReceiptStore, StoreError, StoreProduct, SystemClock,
    SystemInfo, TransactionObserver, TransactionState,
};

use crate::config::{PurchaseConfig, STORE_NAME_APPLE};
use crate::error::PurchaseError;
use crate::mapper::TransactionMapper;
use crate::observer::{AcceptAllPromotions, PromotionObserver, PromotionPolicy, PurchaseObserver};
use crate::types::{Information, Transaction};
use crate::version::VersionProbe;

/// Optional collaborators with sensible defaults.
pub struct ManagerOptions {
    /// Price display formatting.
    pub formatter: Arc<dyn PriceFormatter>,
    /// Time source for purchase-time fallback.
    pub clock: Arc<dyn Clock>,
    /// Gate for store-initiated promotional payments.
    pub promotion_policy: Arc<dyn PromotionPolicy>,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            formatter: Arc::new(LocalePriceFormatter),
            clock: Arc::new(SystemClock),
            promotion_policy: Arc::new(AcceptAllPromotions),
        }
    }
}

/// Per-install state: the caller's observer, its configuration and the
/// mapper derived from both.
#[derive(Clone)]
struct Session {
    observer: Arc<dyn PurchaseObserver>,
    config: Arc<PurchaseConfig>,
    mapper: TransactionMapper,
}

/// Handles of the observers currently registered on the payment queue.
#[derive(Debug, Default, Clone, Copy)]
struct ObserverHandles {
    placeholder: Option<ObserverHandle>,
    full: Option<ObserverHandle>,
}

/// The purchase manager for Apple's App Store billing.
///
/// All operations run on the platform's single callback actor; internal
/// locks only bridge Rust's aliasing rules, never cross-thread contention.
/// The manager itself implements [`TransactionObserver`] and is registered
/// on the payment queue as the full observer once product metadata is
/// available.
pub struct AppStorePurchaseManager {
    queue: Arc<dyn PaymentQueue>,
    requester: Arc<dyn ProductsRequester>,
    receipts: Arc<dyn ReceiptStore>,
    formatter: Arc<dyn PriceFormatter>,
    clock: Arc<dyn Clock>,
    probe: Arc<VersionProbe>,
    promotion_policy: Arc<dyn PromotionPolicy>,
    event_bus: EventBus,
    weak_self: Weak<Self>,

    session: RwLock<Option<Session>>,
    /// Products returned by the last successful product-info request,
    /// replaced wholesale on each new response.
    products: RwLock<Vec<StoreProduct>>,
    /// Transactions collected during a restore flow, flushed as one batch
    /// when the store signals completion.
    restored: Mutex<Vec<Transaction>>,
    handles: Mutex<ObserverHandles>,
}

impl AppStorePurchaseManager {
    /// Creates a manager with default formatter, clock and promotion policy.
    pub fn new(
        queue: Arc<dyn PaymentQueue>,
        requester: Arc<dyn ProductsRequester>,
        receipts: Arc<dyn ReceiptStore>,
        system: Arc<dyn SystemInfo>,
        event_bus: EventBus,
    ) -> Arc<Self> {
        Self::with_options(
            queue,
            requester,
            receipts,
            system,
            event_bus,
            ManagerOptions::default(),
        )
    }

    /// Creates a manager with explicit optional collaborators.
    pub fn with_options(
        queue: Arc<dyn PaymentQueue>,
        requester: Arc<dyn ProductsRequester>,
        receipts: Arc<dyn ReceiptStore>,
        system: Arc<dyn SystemInfo>,
        event_bus: EventBus,
        options: ManagerOptions,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| Self {
            queue,
            requester,
            receipts,
            formatter: options.formatter,
            clock: options.clock,
            probe: Arc::new(VersionProbe::new(system)),
            promotion_policy: options.promotion_policy,
            event_bus,
            weak_self: weak_self.clone(),
            session: RwLock::new(None),
            products: RwLock::new(Vec::new()),
            restored: Mutex::new(Vec::new()),
            handles: Mutex::new(ObserverHandles::default()),
        })
    }

    /// The store this adapter reports transactions for.
    pub fn store_name(&self) -> &'static str {
        STORE_NAME_APPLE
    }

    /// The event bus lifecycle milestones are mirrored onto.
    pub fn events(&self) -> &EventBus {
        &self.event_bus
    }

    /// Installs the manager: capability check, placeholder observer,
    /// product-info request, full observer swap, pending-transaction
    /// re-drive.
    ///
    /// `auto_fetch_information` is accepted for interface compatibility and
    /// ignored: product information is always fetched, because transaction
    /// records cannot be populated without it on this store.
    #[instrument(skip(self, observer, config))]
    pub async fn install(
        &self,
        observer: Arc<dyn PurchaseObserver>,
        config: PurchaseConfig,
        auto_fetch_information: bool,
    ) {
        let _ = auto_fetch_information;
        info!("installing purchase observer");
        self.event_bus.emit(PurchaseEvent::Installing).ok();

        if !self.queue.can_make_payments() {
            error!("device not configured for purchases");
            let err = PurchaseError::DeviceNotConfigured;
            self.event_bus
                .emit(PurchaseEvent::InstallFailed {
                    message: err.to_string(),
                })
                .ok();
            observer.handle_install_error(err).await;
            return;
        }

        let config = Arc::new(config);
        let mapper = TransactionMapper::new(
            Arc::clone(&config),
            Arc::clone(&self.formatter),
            Arc::clone(&self.probe),
            Arc::clone(&self.clock),
        );
        *self.session.write().await = Some(Session {
            observer: Arc::clone(&observer),
            config: Arc::clone(&config),
            mapper,
        });

        // Promotional purchases can arrive before product metadata is
        // ready; park a minimal observer on the queue until the full one
        // is installed.
        {
            let mut handles = self.handles.lock().await;
            if handles.placeholder.is_none() && handles.full.is_none() {
                let placeholder: Arc<dyn TransactionObserver> = Arc::new(PromotionObserver::new(
                    Arc::clone(&self.promotion_policy),
                ));
                handles.placeholder = Some(self.queue.add_observer(placeholder).await);
                info!("startup promotion observer installed");
            }
        }

        let identifiers = config.store_identifiers(STORE_NAME_APPLE);
        info!(count = identifiers.len(), "requesting products");
        match self.requester.fetch_products(identifiers).await {
            Ok(products) => {
                let product_count = products.len();
                info!(product_count, "products successfully received");
                *self.products.write().await = products;

                {
                    let mut handles = self.handles.lock().await;
                    if handles.full.is_none() {
                        if let Some(placeholder) = handles.placeholder.take() {
                            self.queue.remove_observer(placeholder).await;
                        }
                        if let Some(manager) = self.weak_self.upgrade() {
                            let full: Arc<dyn TransactionObserver> = manager;
                            handles.full = Some(self.queue.add_observer(full).await);
                            info!("purchase observer successfully installed");
                        }
                    }
                }

                self.event_bus
                    .emit(PurchaseEvent::Installed { product_count })
                    .ok();
                observer.handle_install().await;

                // Transactions that completed while no full observer was in
                // place are still sitting in the queue; drive them now so
                // they are not lost.
                let pending = self.queue.pending_transactions().await;
                if !pending.is_empty() {
                    info!(count = pending.len(), "driving unfinished transactions");
                }
                self.process_transactions(pending).await;
            }
            Err(e) => {
                error!(error = %e, "error requesting products");
                let err = PurchaseError::ProductRequestFailed {
                    message: e.to_string(),
                };
                self.event_bus
                    .emit(PurchaseEvent::InstallFailed {
                        message: err.to_string(),
                    })
                    .ok();
                observer.handle_install_error(err).await;
            }
        }
    }

    /// Whether the full transaction observer is active.
    pub async fn installed(&self) -> bool {
        self.handles.lock().await.full.is_some()
    }

    /// Removes the active observer and clears all per-install state.
    /// A no-op unless the manager is installed.
    #[instrument(skip(self))]
    pub async fn dispose(&self) {
        let full = self.handles.lock().await.full.take();
        let Some(handle) = full else {
            return;
        };
        self.queue.remove_observer(handle).await;

        *self.products.write().await = Vec::new();
        self.restored.lock().await.clear();
        *self.session.write().await = None;
        info!("disposed purchase manager");
    }

    /// Starts a purchase for the given store-agnostic offer identifier.
    ///
    /// When the product snapshot lacks the product, a single-product info
    /// request is issued first and the payment is enqueued on its response.
    ///
    /// # Panics
    ///
    /// Panics when called before `install`, or when the identifier has no
    /// offer (or no store mapping) configured. Both are programmer errors,
    /// not runtime conditions.
    #[instrument(skip(self))]
    pub async fn purchase(&self, identifier: &str) {
        let session = self
            .current_session()
            .await
            .expect("purchase() called before install()");
        let offer = session
            .config
            .offer(identifier)
            .unwrap_or_else(|| panic!("offer not configured: {identifier}"));
        let store_identifier = offer
            .store_identifier(STORE_NAME_APPLE)
            .unwrap_or_else(|| {
                panic!("offer {identifier} has no identifier for store {STORE_NAME_APPLE}")
            })
            .to_string();

        let known = self
            .products
            .read()
            .await
            .iter()
            .any(|product| product.product_identifier == store_identifier);
        if known {
            info!(identifier, "purchasing product");
            self.queue.add_payment(Payment::new(store_identifier)).await;
            return;
        }

        // Product not loaded yet: fetch its info first and purchase on the
        // response. Exactly one product is expected back.
        info!(%store_identifier, "requesting product info before purchase");
        match self
            .requester
            .fetch_products(vec![store_identifier.clone()])
            .await
        {
            Ok(products) if products.len() == 1 => {
                info!(%store_identifier, "product info received, purchasing");
                *self.products.write().await = products;
                self.queue.add_payment(Payment::new(store_identifier)).await;
            }
            Ok(products) => {
                let err = PurchaseError::UnexpectedProductCount {
                    identifier: store_identifier,
                    count: products.len(),
                };
                error!(error = %err, "purchase aborted");
                self.report_purchase_error(&session, err).await;
            }
            Err(e) => {
                let err = PurchaseError::ProductRequestFailed {
                    message: e.to_string(),
                };
                error!(error = %err, "error requesting product info to later purchase");
                self.report_purchase_error(&session, err).await;
            }
        }
    }

    /// Asks the store to redeliver completed purchases. Results arrive as
    /// restored transaction callbacks followed by a terminal
    /// restore-finished or restore-failed signal.
    #[instrument(skip(self))]
    pub async fn purchase_restore(&self) {
        info!("restoring purchases");
        self.restored.lock().await.clear();
        self.queue.restore_completed_transactions().await;
    }

    /// Displayable information for a configured offer, or
    /// [`Information::unavailable`] when its product metadata is not
    /// loaded.
    pub async fn get_information(&self, identifier: &str) -> Information {
        let Some(session) = self.current_session().await else {
            return Information::unavailable();
        };
        let Some(store_identifier) = session
            .config
            .offer(identifier)
            .and_then(|offer| offer.store_identifier(STORE_NAME_APPLE))
            .map(str::to_string)
        else {
            return Information::unavailable();
        };

        let products = self.products.read().await;
        match products
            .iter()
            .find(|product| product.product_identifier == store_identifier)
        {
            Some(product) => session.mapper.map_information(product),
            None => Information::unavailable(),
        }
    }

    async fn current_session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    async fn report_purchase_error(&self, session: &Session, err: PurchaseError) {
        self.event_bus
            .emit(PurchaseEvent::PurchaseFailed {
                message: err.to_string(),
            })
            .ok();
        session.observer.handle_purchase_error(err).await;
    }

    async fn process_transactions(&self, transactions: Vec<PaymentTransaction>) {
        for transaction in transactions {
            match transaction.state {
                TransactionState::Purchased => self.handle_purchased(transaction).await,
                TransactionState::Failed => self.handle_failed(transaction).await,
                TransactionState::Restored => self.handle_restored(transaction).await,
                // In-flight and deferred transactions resolve later.
                TransactionState::Purchasing | TransactionState::Deferred => {}
            }
        }
    }

    async fn handle_purchased(&self, transaction: PaymentTransaction) {
        let Some(session) = self.current_session().await else {
            return;
        };
        let snapshot = self.products.read().await.clone();
        let Some(mut record) = session.mapper.map_transaction(&transaction, &snapshot) else {
            // Unmappable: not reported, not finished. The queue redelivers
            // it on the next round.
            return;
        };

        if record.transaction_data_signature.is_none() && self.probe.supports_receipt_url() {
            match self.receipts.app_store_receipt().await {
                Some(receipt) => {
                    record.transaction_data_signature = Some(BASE64.encode(receipt));
                }
                None => {
                    info!("fetching receipt");
                    match self.receipts.refresh_receipt().await {
                        Ok(()) => match self.receipts.app_store_receipt().await {
                            Some(receipt) => {
                                info!("receipt was fetched");
                                record.transaction_data_signature = Some(BASE64.encode(receipt));
                            }
                            None => warn!("receipt refresh completed without receipt data"),
                        },
                        // Refresh failure still delivers the purchase, just
                        // without a refreshed receipt.
                        Err(e) => error!(error = %e, "receipt fetching failed"),
                    }
                }
            }
        }

        info!(order_id = ?record.order_id, "transaction was completed");
        self.event_bus
            .emit(PurchaseEvent::PurchaseCompleted {
                identifier: record.identifier.clone(),
                order_id: record.order_id.clone(),
            })
            .ok();
        session.observer.handle_purchase(record).await;
        self.queue.finish_transaction(&transaction).await;
    }

    async fn handle_failed(&self, transaction: PaymentTransaction) {
        let Some(session) = self.current_session().await else {
            return;
        };
        match &transaction.error {
            None => {
                error!("transaction failed without an error object");
                let err = PurchaseError::TransactionFailed {
                    message: "no failure reason reported by the store".to_string(),
                };
                self.report_purchase_error(&session, err).await;
            }
            Some(e) if e.is_cancellation() => {
                warn!("transaction was cancelled by user");
                self.event_bus.emit(PurchaseEvent::PurchaseCanceled).ok();
                session.observer.handle_purchase_canceled().await;
            }
            Some(e) => {
                error!(error = %e, "transaction failed");
                let err = PurchaseError::TransactionFailed {
                    message: e.description.clone(),
                };
                self.report_purchase_error(&session, err).await;
            }
        }
        // Failed transactions are always dequeued.
        self.queue.finish_transaction(&transaction).await;
    }

    async fn handle_restored(&self, transaction: PaymentTransaction) {
        let Some(session) = self.current_session().await else {
            return;
        };
        let snapshot = self.products.read().await.clone();
        let Some(record) = session.mapper.map_transaction(&transaction, &snapshot) else {
            // Left unfinished; the queue will redeliver it.
            return;
        };

        debug!(order_id = ?record.order_id, "transaction has been restored");
        self.restored.lock().await.push(record);
        self.queue.finish_transaction(&transaction).await;
    }
}

#[async_trait]
impl TransactionObserver for AppStorePurchaseManager {
    async fn updated_transactions(&self, transactions: Vec<PaymentTransaction>) {
        self.process_transactions(transactions).await;
    }

    async fn restore_completed(&self) {
        let Some(session) = self.current_session().await else {
            return;
        };
        let batch = std::mem::take(&mut *self.restored.lock().await);
        info!(count = batch.len(), "all transactions have been restored");
        self.event_bus
            .emit(PurchaseEvent::RestoreCompleted { count: batch.len() })
            .ok();
        session.observer.handle_restore(batch).await;
    }

    async fn restore_failed(&self, error: StoreError) {
        let Some(session) = self.current_session().await else {
            return;
        };
        if error.is_cancellation() {
            warn!("restoring of transactions was cancelled by user");
            self.event_bus.emit(PurchaseEvent::PurchaseCanceled).ok();
            session.observer.handle_purchase_canceled().await;
        } else {
            error!(error = %error, "restoring of transactions failed");
            let err = PurchaseError::RestoreFailed {
                message: error.description.clone(),
            };
            self.event_bus
                .emit(PurchaseEvent::RestoreFailed {
                    message: err.to_string(),
                })
                .ok();
            session.observer.handle_restore_error(err).await;
        }
    }

    async fn should_add_store_payment(&self, payment: &Payment, product: &StoreProduct) -> bool {
        self.promotion_policy.should_process(payment, product)
    }
}
