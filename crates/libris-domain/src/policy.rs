//! Lending rules applied to every borrow
//!
//! The policy itself is pure: the store reads the current counters inside its
//! transaction and asks the policy whether the borrow may proceed.

use std::fmt;

/// Default number of books a reader may hold at once
pub const DEFAULT_MAX_ACTIVE_LOANS: u32 = 3;

/// Reasons a borrow is refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorrowRejection {
    /// No copy of the book is on the shelf
    OutOfStock,

    /// The reader already holds the maximum number of books
    LoanLimitReached {
        /// The configured cap
        limit: u32,
    },
}

impl fmt::Display for BorrowRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BorrowRejection::OutOfStock => {
                write!(f, "No copies of this book are available for lending")
            }
            BorrowRejection::LoanLimitReached { limit } => {
                write!(f, "A reader cannot hold more than {} books at once", limit)
            }
        }
    }
}

impl std::error::Error for BorrowRejection {}

/// Lending policy
///
/// # Examples
///
/// ```
/// use libris_domain::{BorrowRejection, LendingPolicy};
///
/// let policy = LendingPolicy::default();
/// assert!(policy.check_borrow(1, 2).is_ok());
/// assert_eq!(policy.check_borrow(0, 0), Err(BorrowRejection::OutOfStock));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LendingPolicy {
    /// Maximum simultaneously active loans per reader
    pub max_active_loans: u32,
}

impl Default for LendingPolicy {
    fn default() -> Self {
        Self {
            max_active_loans: DEFAULT_MAX_ACTIVE_LOANS,
        }
    }
}

impl LendingPolicy {
    /// Create a policy with the given per-reader cap
    pub fn new(max_active_loans: u32) -> Self {
        Self { max_active_loans }
    }

    /// Decide whether a borrow may proceed
    ///
    /// Stock is checked before the reader's cap, so an exhausted book reports
    /// `OutOfStock` even for a reader who is also at the limit.
    pub fn check_borrow(
        &self,
        available_copies: i64,
        active_loans: u32,
    ) -> Result<(), BorrowRejection> {
        if available_copies <= 0 {
            return Err(BorrowRejection::OutOfStock);
        }

        if active_loans >= self.max_active_loans {
            return Err(BorrowRejection::LoanLimitReached {
                limit: self.max_active_loans,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cap_is_three() {
        assert_eq!(LendingPolicy::default().max_active_loans, 3);
    }

    #[test]
    fn test_cap_reached() {
        let policy = LendingPolicy::default();
        assert!(policy.check_borrow(5, 2).is_ok());

        let err = policy.check_borrow(5, 3).unwrap_err();
        assert_eq!(err, BorrowRejection::LoanLimitReached { limit: 3 });
        assert!(err.to_string().contains("more than 3 books"));
    }

    #[test]
    fn test_stock_checked_first() {
        let policy = LendingPolicy::new(1);
        assert_eq!(policy.check_borrow(0, 1), Err(BorrowRejection::OutOfStock));
        assert_eq!(policy.check_borrow(-1, 0), Err(BorrowRejection::OutOfStock));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: a borrow is allowed exactly when stock and cap both permit it
        #[test]
        fn test_check_borrow_matches_rules(
            copies in -5i64..50,
            active in 0u32..10,
            cap in 1u32..10,
        ) {
            let policy = LendingPolicy::new(cap);
            let allowed = policy.check_borrow(copies, active).is_ok();
            prop_assert_eq!(allowed, copies > 0 && active < cap);
        }
    }
}
