use thiserror::Error;

/// Errors surfaced through the purchase observer callbacks.
///
/// User cancellation is not an error; it is reported through the dedicated
/// cancellation callback. Programmer misuse (purchasing an unconfigured
/// identifier, purchasing before install) panics instead of producing a
/// variant here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PurchaseError {
    #[error("device not configured for purchases")]
    DeviceNotConfigured,

    #[error("product request failed: {message}")]
    ProductRequestFailed { message: String },

    #[error("wrong product info count for {identifier}: expected 1, got {count}")]
    UnexpectedProductCount { identifier: String, count: usize },

    #[error("transaction failed: {message}")]
    TransactionFailed { message: String },

    #[error("restoring purchases failed: {message}")]
    RestoreFailed { message: String },
}

pub type Result<T> = std::result::Result<T, PurchaseError>;
