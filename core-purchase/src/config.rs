//! Offer configuration.
//!
//! Maps store-agnostic offer identifiers to store-specific product
//! identifiers. The configuration is supplied once at install time and is
//! immutable afterwards.

use std::collections::HashMap;

/// Store name reported by the Apple App Store adapter.
pub const STORE_NAME_APPLE: &str = "AppleiOS";

/// Category of a purchasable offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferType {
    /// Can be purchased repeatedly (e.g. coins).
    Consumable,
    /// Purchased once, owned forever (e.g. a level pack).
    Entitlement,
    /// Recurring subscription.
    Subscription,
}

/// A store-agnostic purchasable item, mapped to one or more store-specific
/// product identifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct Offer {
    identifier: String,
    offer_type: OfferType,
    store_identifiers: HashMap<String, String>,
}

impl Offer {
    pub fn new(identifier: impl Into<String>, offer_type: OfferType) -> Self {
        Self {
            identifier: identifier.into(),
            offer_type,
            store_identifiers: HashMap::new(),
        }
    }

    /// Maps this offer to a product identifier in the given store.
    pub fn with_store_identifier(
        mut self,
        store_name: impl Into<String>,
        store_identifier: impl Into<String>,
    ) -> Self {
        self.store_identifiers
            .insert(store_name.into(), store_identifier.into());
        self
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn offer_type(&self) -> OfferType {
        self.offer_type
    }

    /// The product identifier this offer uses in the given store, if mapped.
    pub fn store_identifier(&self, store_name: &str) -> Option<&str> {
        self.store_identifiers.get(store_name).map(String::as_str)
    }
}

/// The full set of offers the caller sells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PurchaseConfig {
    offers: Vec<Offer>,
}

impl PurchaseConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_offer(mut self, offer: Offer) -> Self {
        self.offers.push(offer);
        self
    }

    pub fn offers(&self) -> &[Offer] {
        &self.offers
    }

    pub fn offer_count(&self) -> usize {
        self.offers.len()
    }

    /// Looks up an offer by its store-agnostic identifier.
    pub fn offer(&self, identifier: &str) -> Option<&Offer> {
        self.offers
            .iter()
            .find(|offer| offer.identifier == identifier)
    }

    /// Looks up the offer mapped to a store-specific product identifier.
    pub fn offer_for_store(&self, store_name: &str, store_identifier: &str) -> Option<&Offer> {
        self.offers
            .iter()
            .find(|offer| offer.store_identifier(store_name) == Some(store_identifier))
    }

    /// All product identifiers mapped for the given store. Offers without a
    /// mapping for this store are skipped.
    pub fn store_identifiers(&self, store_name: &str) -> Vec<String> {
        self.offers
            .iter()
            .filter_map(|offer| offer.store_identifier(store_name))
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PurchaseConfig {
        PurchaseConfig::new()
            .with_offer(
                Offer::new("gold_pack", OfferType::Consumable)
                    .with_store_identifier(STORE_NAME_APPLE, "com.example.gold"),
            )
            .with_offer(
                Offer::new("premium", OfferType::Subscription)
                    .with_store_identifier(STORE_NAME_APPLE, "com.example.premium")
                    .with_store_identifier("GooglePlay", "example_premium"),
            )
            .with_offer(Offer::new("android_only", OfferType::Entitlement)
                .with_store_identifier("GooglePlay", "example_android"))
    }

    #[test]
    fn offer_lookup_by_identifier() {
        let config = config();
        assert_eq!(
            config.offer("gold_pack").map(Offer::identifier),
            Some("gold_pack")
        );
        assert!(config.offer("unknown").is_none());
    }

    #[test]
    fn offer_lookup_by_store_identifier() {
        let config = config();
        let offer = config
            .offer_for_store(STORE_NAME_APPLE, "com.example.premium")
            .unwrap();
        assert_eq!(offer.identifier(), "premium");
        assert_eq!(offer.offer_type(), OfferType::Subscription);
        assert!(config
            .offer_for_store(STORE_NAME_APPLE, "com.example.unknown")
            .is_none());
    }

    #[test]
    fn store_identifiers_skip_unmapped_offers() {
        let identifiers = config().store_identifiers(STORE_NAME_APPLE);
        assert_eq!(identifiers, vec!["com.example.gold", "com.example.premium"]);
    }
}
