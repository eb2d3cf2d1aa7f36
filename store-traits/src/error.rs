use thiserror::Error;

/// Error code the store reports when the user aborts a payment or restore
/// flow. Matches the platform's payment-cancelled constant.
pub const PAYMENT_CANCELLED_CODE: i64 = 2;

/// Error reported by the native store layer.
///
/// Wraps the platform error code together with its localized description.
/// The code is preserved so the purchase core can route user cancellation
/// separately from real failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{description} (code {code})")]
pub struct StoreError {
    /// Platform error code.
    pub code: i64,
    /// Localized error description from the platform.
    pub description: String,
}

impl StoreError {
    pub fn new(code: i64, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
        }
    }

    /// A user-cancellation error.
    pub fn cancelled() -> Self {
        Self::new(PAYMENT_CANCELLED_CODE, "payment cancelled by user")
    }

    /// Whether this error is a user-initiated cancellation.
    pub fn is_cancellation(&self) -> bool {
        self.code == PAYMENT_CANCELLED_CODE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_is_detected_by_code() {
        assert!(StoreError::cancelled().is_cancellation());
        assert!(StoreError::new(PAYMENT_CANCELLED_CODE, "user tapped cancel").is_cancellation());
        assert!(!StoreError::new(0, "unknown error").is_cancellation());
    }
}
