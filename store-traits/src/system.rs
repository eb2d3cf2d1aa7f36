//! System Information, Time and Formatting Abstractions
//!
//! Injectable host facts used by the purchase core: the OS version string
//! (feature gating), a time source (deterministic testing) and locale-aware
//! price formatting.

use chrono::{DateTime, Utc};

use crate::products::PriceLocale;

/// Host system information.
pub trait SystemInfo: Send + Sync {
    /// Dotted OS version string (e.g. `"11.2.5"`), when available.
    fn os_version(&self) -> Option<String>;
}

/// Time source trait
///
/// Abstracts system time to enable deterministic testing.
pub trait Clock: Send + Sync {
    /// Get current UTC time
    fn now(&self) -> DateTime<Utc>;

    /// Get current Unix timestamp in seconds
    fn unix_timestamp(&self) -> i64 {
        self.now().timestamp()
    }
}

/// System clock implementation using actual system time
#[derive(Debug, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Locale-aware price display formatting.
///
/// Replaces the platform's process-wide currency number formatter with an
/// explicit dependency so the core stays testable without a real locale
/// database.
pub trait PriceFormatter: Send + Sync {
    /// Format a price in major currency units for display.
    fn format_price(&self, price: f64, locale: &PriceLocale) -> String;
}

/// Default formatter: currency symbol followed by the price with two
/// fractional digits.
#[derive(Debug, Clone, Default)]
pub struct LocalePriceFormatter;

impl PriceFormatter for LocalePriceFormatter {
    fn format_price(&self, price: f64, locale: &PriceLocale) -> String {
        format!("{}{:.2}", locale.currency_symbol, price)
    }
}
