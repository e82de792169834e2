//! Gatekeeper error types

use thiserror::Error;

/// Errors that can occur during gatekeeper operations
///
/// Rejected input is not an error; it is reported through `ValidationResult`.
#[derive(Error, Debug)]
pub enum GatekeeperError {
    /// Store error during a duplicate lookup
    #[error("Store error: {0}")]
    Store(String),
}
