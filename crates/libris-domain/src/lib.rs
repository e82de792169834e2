//! Libris Domain Layer
//!
//! This crate contains the core business logic and domain model for Libris.
//! It depends only on `uuid` and defines the records, lending rules, and trait
//! interfaces that all other layers depend upon.
//!
//! ## Key Concepts
//!
//! - **Book**: a catalog item with a count of copies on the shelf
//! - **Reader**: a registered user eligible to borrow
//! - **Loan**: one reader holding one copy; active until returned
//! - **Lending policy**: stock must be available and a reader may hold at most
//!   `max_active_loans` books at once
//!
//! ## Architecture
//!
//! - Pure business logic only
//! - Infrastructure implementations live in other crates
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod book;
pub mod id;
pub mod loan;
pub mod policy;
pub mod reader;
pub mod traits;

// Re-exports for convenience
pub use book::{Book, NewBook};
pub use id::{BookId, LoanId, ReaderId};
pub use loan::{Loan, LoanError, LoanQuery};
pub use policy::{BorrowRejection, LendingPolicy, DEFAULT_MAX_ACTIVE_LOANS};
pub use reader::{NewReader, Reader};
