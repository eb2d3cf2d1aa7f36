//! Native Product Model and Metadata Requests
//!
//! Mirrors the store's product descriptors and the asynchronous product-info
//! request the core issues to load them.

use async_trait::async_trait;

use crate::error::StoreError;

/// Locale information attached to a product's price.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceLocale {
    /// ISO 4217 currency code, when the locale exposes one.
    pub currency_code: Option<String>,
    /// Currency symbol used for display formatting.
    pub currency_symbol: String,
}

impl PriceLocale {
    pub fn new(currency_code: impl Into<String>, currency_symbol: impl Into<String>) -> Self {
        Self {
            currency_code: Some(currency_code.into()),
            currency_symbol: currency_symbol.into(),
        }
    }

    /// A locale with no currency information.
    pub fn unknown() -> Self {
        Self {
            currency_code: None,
            currency_symbol: String::new(),
        }
    }
}

/// Billing period unit of a native subscription period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorePeriodUnit {
    Day,
    Week,
    Month,
    Year,
}

/// Length of a native subscription period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionPeriod {
    /// Number of `unit`s the period spans. Zero means no period.
    pub number_of_units: u32,
    pub unit: StorePeriodUnit,
}

/// Introductory price descriptor attached to a subscription product.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDiscount {
    /// Price during the introductory period. Zero for a free trial.
    pub price: f64,
    /// Length of the introductory period, when the store provides one.
    pub subscription_period: Option<SubscriptionPeriod>,
}

/// Product descriptor returned by a product-info request.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreProduct {
    /// Store-specific product identifier.
    pub product_identifier: String,
    /// Localized display title.
    pub localized_title: String,
    /// Localized display description.
    pub localized_description: String,
    /// Price in major currency units.
    pub price: f64,
    /// Locale the price is denominated in.
    pub price_locale: PriceLocale,
    /// Introductory pricing, present only on newer OS versions.
    pub introductory_price: Option<ProductDiscount>,
}

/// Product metadata request capability.
///
/// One-shot asynchronous lookup of product descriptors by store identifier.
/// The store omits identifiers it does not know; callers must check the
/// response count rather than assume it matches the request.
///
/// There is no cancellation and no timeout: a stalled native request never
/// completes its future.
#[async_trait]
pub trait ProductsRequester: Send + Sync {
    /// Fetch product descriptors for the given store identifiers.
    async fn fetch_products(
        &self,
        identifiers: Vec<String>,
    ) -> Result<Vec<StoreProduct>, StoreError>;
}
