//! Libris Gatekeeper
//!
//! Validates book and reader drafts before they are persisted.
//!
//! The Gatekeeper provides:
//! - Required-field and length checks
//! - ISBN format (13 digits) and email format checks
//! - Copy counts that are never negative
//! - Duplicate ISBN / email detection against a store
//!
//! Lending rules (stock, per-reader cap) are not checked here: they depend on
//! live counters and are enforced inside the store's borrow transaction.
//!
//! # Examples
//!
//! ```
//! use libris_domain::NewBook;
//! use libris_gatekeeper::{Gatekeeper, ValidationConfig};
//! use libris_store::SqliteStore;
//!
//! let gatekeeper = Gatekeeper::new(ValidationConfig::default());
//! let draft = NewBook::new("Dune", "Frank Herbert", 2);
//!
//! let result = gatekeeper.validate_book::<SqliteStore>(&draft, None, None).unwrap();
//! assert!(result.is_accepted());
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod validator;

pub use config::ValidationConfig;
pub use error::GatekeeperError;
pub use validator::{
    is_valid_email, is_valid_isbn, Gatekeeper, RejectionReason, ValidationResult,
    ValidationStatus, ISBN_LENGTH,
};
