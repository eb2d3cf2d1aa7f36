//! Store-agnostic purchase model.
//!
//! These records are what the surrounding purchase framework consumes; they
//! carry no native store types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use store_traits::StorePeriodUnit;

/// A completed purchase or restore, built fresh from a native transaction
/// plus the current product snapshot and offer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Store-agnostic offer identifier.
    pub identifier: String,
    /// Name of the store this transaction came from.
    pub store_name: String,
    /// Stable order identifier: the original transaction id for restores
    /// (restores get a fresh working id each time), the transaction's own id
    /// for first-time purchases.
    pub order_id: Option<String>,
    /// When the purchase was made.
    pub purchase_time: DateTime<Utc>,
    /// Human-readable purchase description.
    pub purchase_text: String,
    /// Cost in minor currency units (cents).
    pub purchase_cost: i64,
    /// ISO 4217 currency code; absent when product metadata was not loaded.
    pub purchase_cost_currency: Option<String>,
    /// Always absent: this store has no programmatic refund notification.
    pub reversal_time: Option<DateTime<Utc>>,
    /// Always absent: this store has no programmatic refund notification.
    pub reversal_text: Option<String>,
    /// Base64-encoded payment request payload, when one was attached.
    pub transaction_data: Option<String>,
    /// Base64-encoded receipt. Best effort; may be absent.
    pub transaction_data_signature: Option<String>,
}

/// Displayable pricing and description for a configured offer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Information {
    /// Localized product title.
    pub local_name: Option<String>,
    /// Localized product description.
    pub local_description: Option<String>,
    /// Locale-formatted price string for display.
    pub local_pricing: Option<String>,
    /// ISO 4217 currency code.
    pub price_currency_code: Option<String>,
    /// Price in minor currency units, ceiling-rounded.
    pub price_in_cents: Option<u32>,
    /// Raw price in major currency units.
    pub price_as_double: Option<f64>,
    /// Zero-price introductory period, when the product offers one.
    pub free_trial_period: Option<FreeTrialPeriod>,
}

impl Information {
    /// The information record returned when product metadata was never
    /// loaded for an identifier.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Whether product metadata backs this record.
    pub fn is_available(&self) -> bool {
        self.local_name.is_some()
    }
}

/// A zero-price interval preceding a subscription's regular billing.
///
/// Reduced-price introductory offers are not modeled; only fully free
/// periods appear here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeTrialPeriod {
    /// Number of `unit`s the trial spans.
    pub number_of_units: u32,
    pub unit: PeriodUnit,
}

/// Store-agnostic billing period unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodUnit {
    Day,
    Week,
    Month,
    Year,
}

impl From<StorePeriodUnit> for PeriodUnit {
    fn from(unit: StorePeriodUnit) -> Self {
        match unit {
            StorePeriodUnit::Day => PeriodUnit::Day,
            StorePeriodUnit::Week => PeriodUnit::Week,
            StorePeriodUnit::Month => PeriodUnit::Month,
            StorePeriodUnit::Year => PeriodUnit::Year,
        }
    }
}
