//! Transaction and product mapping.
//!
//! Converts native payment transactions and product descriptors into the
//! store-agnostic model, resolving offers through the purchase
//! configuration.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use tracing::warn;

use store_traits::{Clock, PaymentTransaction, PriceFormatter, StoreProduct};

use crate::config::{PurchaseConfig, STORE_NAME_APPLE};
use crate::types::{FreeTrialPeriod, Information, Transaction};
use crate::version::VersionProbe;

/// Maps native store objects into the store-agnostic model.
///
/// Stateless: the product snapshot is passed in per call because it is
/// replaced wholesale on every product-info response.
#[derive(Clone)]
pub struct TransactionMapper {
    config: Arc<PurchaseConfig>,
    formatter: Arc<dyn PriceFormatter>,
    probe: Arc<VersionProbe>,
    clock: Arc<dyn Clock>,
}

impl TransactionMapper {
    pub fn new(
        config: Arc<PurchaseConfig>,
        formatter: Arc<dyn PriceFormatter>,
        probe: Arc<VersionProbe>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            formatter,
            probe,
            clock,
        }
    }

    /// Builds a transaction record from a native payment transaction.
    ///
    /// Returns `None` when no offer is mapped to the payment's store
    /// identifier: such a transaction must not be reported to the caller.
    /// A missing product descriptor only degrades the record (zero cost, no
    /// currency, raw identifier in the purchase text).
    pub fn map_transaction(
        &self,
        transaction: &PaymentTransaction,
        products: &[StoreProduct],
    ) -> Option<Transaction> {
        let store_identifier = &transaction.payment.product_identifier;

        let offer = match self
            .config
            .offer_for_store(STORE_NAME_APPLE, store_identifier)
        {
            Some(offer) => offer,
            None => {
                warn!(
                    store_identifier,
                    "product not configured in purchase config, skipping transaction"
                );
                return None;
            }
        };

        let product = products
            .iter()
            .find(|product| product.product_identifier == *store_identifier);
        if product.is_none() {
            warn!(store_identifier, "product not registered/loaded");
        }

        let (purchase_text, purchase_cost, purchase_cost_currency) = match product {
            Some(product) => (
                format!("Purchased: {}", product.localized_title),
                (product.price * 100.0).round() as i64,
                product.price_locale.currency_code.clone(),
            ),
            None => (format!("Purchased: {store_identifier}"), 0, None),
        };

        Some(Transaction {
            identifier: offer.identifier().to_string(),
            store_name: STORE_NAME_APPLE.to_string(),
            order_id: Self::order_id(transaction),
            purchase_time: transaction
                .transaction_date
                .unwrap_or_else(|| self.clock.now()),
            purchase_text,
            purchase_cost,
            purchase_cost_currency,
            reversal_time: None,
            reversal_text: None,
            transaction_data: transaction
                .payment
                .request_data
                .as_ref()
                .map(|data| BASE64.encode(data)),
            transaction_data_signature: transaction
                .transaction_receipt
                .as_ref()
                .map(|receipt| BASE64.encode(receipt)),
        })
    }

    /// The stable order identifier of a purchase: the original transaction
    /// id when the store exposes one (restores), the transaction's own id
    /// otherwise (first-time purchases).
    pub fn order_id(transaction: &PaymentTransaction) -> Option<String> {
        transaction
            .original_transaction_identifier
            .clone()
            .or_else(|| transaction.transaction_identifier.clone())
    }

    /// Builds a displayable information record from a product descriptor.
    pub fn map_information(&self, product: &StoreProduct) -> Information {
        Information {
            local_name: Some(product.localized_title.clone()),
            local_description: Some(product.localized_description.clone()),
            local_pricing: Some(
                self.formatter
                    .format_price(product.price, &product.price_locale),
            ),
            price_currency_code: product.price_locale.currency_code.clone(),
            price_in_cents: Some((product.price * 100.0).ceil() as u32),
            price_as_double: Some(product.price),
            free_trial_period: self.free_trial_period(product),
        }
    }

    /// Extracts a free-trial period from a product's introductory price.
    ///
    /// Only zero-price introductory offers are modeled; reduced-price
    /// offers are treated as absent. Returns `None` below the OS version
    /// that introduced introductory pricing.
    pub fn free_trial_period(&self, product: &StoreProduct) -> Option<FreeTrialPeriod> {
        if !self.probe.supports_introductory_price() {
            return None;
        }

        let discount = product.introductory_price.as_ref()?;
        let period = discount.subscription_period?;
        if period.number_of_units == 0 {
            return None;
        }
        if discount.price > 0.0 {
            // Not a free trial; reduced-price introductory offers are
            // unsupported.
            return None;
        }

        Some(FreeTrialPeriod {
            number_of_units: period.number_of_units,
            unit: period.unit.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use store_traits::{
        LocalePriceFormatter, Payment, PriceLocale, ProductDiscount, StorePeriodUnit,
        SubscriptionPeriod, SystemInfo, TransactionState,
    };

    use crate::config::{Offer, OfferType};
    use crate::types::PeriodUnit;

    struct FixedVersion(&'static str);

    impl SystemInfo for FixedVersion {
        fn os_version(&self) -> Option<String> {
            Some(self.0.to_string())
        }
    }

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 5, 17, 12, 0, 0).unwrap()
    }

    fn mapper_on(version: &'static str) -> TransactionMapper {
        let config = PurchaseConfig::new().with_offer(
            Offer::new("gold_pack", OfferType::Consumable)
                .with_store_identifier(STORE_NAME_APPLE, "com.example.gold"),
        );
        TransactionMapper::new(
            Arc::new(config),
            Arc::new(LocalePriceFormatter),
            Arc::new(VersionProbe::new(Arc::new(FixedVersion(version)))),
            Arc::new(FixedClock(test_time())),
        )
    }

    fn gold_product() -> StoreProduct {
        StoreProduct {
            product_identifier: "com.example.gold".to_string(),
            localized_title: "Gold Pack".to_string(),
            localized_description: "A pile of gold".to_string(),
            price: 4.99,
            price_locale: PriceLocale::new("USD", "$"),
            introductory_price: None,
        }
    }

    fn purchased(store_identifier: &str) -> PaymentTransaction {
        let mut tx =
            PaymentTransaction::new(TransactionState::Purchased, Payment::new(store_identifier));
        tx.transaction_identifier = Some("2000001".to_string());
        tx.transaction_date = Some(test_time());
        tx
    }

    #[test]
    fn unconfigured_store_identifier_yields_no_record() {
        let mapper = mapper_on("12.0");
        let tx = purchased("com.example.unknown");
        assert!(mapper.map_transaction(&tx, &[gold_product()]).is_none());
    }

    #[test]
    fn order_id_prefers_the_original_transaction() {
        let mapper = mapper_on("12.0");
        let mut tx = purchased("com.example.gold");
        tx.original_transaction_identifier = Some("1000001".to_string());

        let record = mapper.map_transaction(&tx, &[gold_product()]).unwrap();
        assert_eq!(record.order_id.as_deref(), Some("1000001"));
    }

    #[test]
    fn order_id_falls_back_to_the_transactions_own_identifier() {
        let mapper = mapper_on("12.0");
        let tx = purchased("com.example.gold");

        let record = mapper.map_transaction(&tx, &[gold_product()]).unwrap();
        assert_eq!(record.order_id.as_deref(), Some("2000001"));
    }

    #[test]
    fn loaded_product_fills_cost_and_currency() {
        let mapper = mapper_on("12.0");
        let tx = purchased("com.example.gold");

        let record = mapper.map_transaction(&tx, &[gold_product()]).unwrap();
        assert_eq!(record.identifier, "gold_pack");
        assert_eq!(record.store_name, STORE_NAME_APPLE);
        assert_eq!(record.purchase_text, "Purchased: Gold Pack");
        assert_eq!(record.purchase_cost, 499);
        assert_eq!(record.purchase_cost_currency.as_deref(), Some("USD"));
        assert!(record.reversal_time.is_none());
        assert!(record.reversal_text.is_none());
    }

    #[test]
    fn unloaded_product_degrades_to_zero_cost() {
        let mapper = mapper_on("12.0");
        let tx = purchased("com.example.gold");

        let record = mapper.map_transaction(&tx, &[]).unwrap();
        assert_eq!(record.purchase_text, "Purchased: com.example.gold");
        assert_eq!(record.purchase_cost, 0);
        assert!(record.purchase_cost_currency.is_none());
    }

    #[test]
    fn missing_transaction_date_uses_the_injected_clock() {
        let mapper = mapper_on("12.0");
        let mut tx = purchased("com.example.gold");
        tx.transaction_date = None;

        let record = mapper.map_transaction(&tx, &[gold_product()]).unwrap();
        assert_eq!(record.purchase_time, test_time());
    }

    #[test]
    fn per_transaction_receipt_becomes_the_signature() {
        let mapper = mapper_on("12.0");
        let mut tx = purchased("com.example.gold");
        tx.transaction_receipt = Some(b"receipt-bytes".to_vec());

        let record = mapper.map_transaction(&tx, &[gold_product()]).unwrap();
        assert_eq!(
            record.transaction_data_signature.as_deref(),
            Some(BASE64.encode(b"receipt-bytes").as_str())
        );
    }

    #[test]
    fn information_uses_ceiling_rounding_for_cents() {
        let mapper = mapper_on("12.0");
        let info = mapper.map_information(&gold_product());

        assert_eq!(info.local_name.as_deref(), Some("Gold Pack"));
        assert_eq!(info.local_pricing.as_deref(), Some("$4.99"));
        assert_eq!(info.price_currency_code.as_deref(), Some("USD"));
        assert_eq!(info.price_in_cents, Some(499));
        assert_eq!(info.price_as_double, Some(4.99));

        let mut cheap = gold_product();
        cheap.price = 2.5;
        assert_eq!(mapper.map_information(&cheap).price_in_cents, Some(250));
    }

    fn subscription_with(discount: ProductDiscount) -> StoreProduct {
        let mut product = gold_product();
        product.introductory_price = Some(discount);
        product
    }

    #[test]
    fn free_trial_requires_the_introductory_price_gate() {
        let discount = ProductDiscount {
            price: 0.0,
            subscription_period: Some(SubscriptionPeriod {
                number_of_units: 7,
                unit: StorePeriodUnit::Day,
            }),
        };
        let product = subscription_with(discount);

        assert!(mapper_on("11.1").free_trial_period(&product).is_none());
        assert!(mapper_on("11.2").free_trial_period(&product).is_some());
    }

    #[test]
    fn positive_introductory_price_is_never_a_free_trial() {
        let discount = ProductDiscount {
            price: 0.99,
            subscription_period: Some(SubscriptionPeriod {
                number_of_units: 3,
                unit: StorePeriodUnit::Month,
            }),
        };
        let product = subscription_with(discount);
        assert!(mapper_on("12.0").free_trial_period(&product).is_none());
    }

    #[test]
    fn zero_price_discount_maps_to_a_matching_period() {
        let discount = ProductDiscount {
            price: 0.0,
            subscription_period: Some(SubscriptionPeriod {
                number_of_units: 2,
                unit: StorePeriodUnit::Week,
            }),
        };
        let product = subscription_with(discount);

        let period = mapper_on("12.0").free_trial_period(&product).unwrap();
        assert_eq!(period.number_of_units, 2);
        assert_eq!(period.unit, PeriodUnit::Week);
    }

    #[test]
    fn missing_or_empty_period_yields_no_free_trial() {
        let mapper = mapper_on("12.0");

        let no_period = subscription_with(ProductDiscount {
            price: 0.0,
            subscription_period: None,
        });
        assert!(mapper.free_trial_period(&no_period).is_none());

        let zero_length = subscription_with(ProductDiscount {
            price: 0.0,
            subscription_period: Some(SubscriptionPeriod {
                number_of_units: 0,
                unit: StorePeriodUnit::Day,
            }),
        });
        assert!(mapper.free_trial_period(&zero_length).is_none());

        assert!(mapper.free_trial_period(&gold_product()).is_none());
    }
}
