//! Loan module - a single borrowing transaction

use crate::{BookId, LoanId, ReaderId};
use std::fmt;

/// Errors raised by loan state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanError {
    /// The loan already carries a return timestamp
    AlreadyReturned {
        /// When the loan was returned
        returned_at: u64,
    },
}

impl fmt::Display for LoanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoanError::AlreadyReturned { .. } => write!(f, "This book has already been returned"),
        }
    }
}

impl std::error::Error for LoanError {}

/// One reader holding one copy of one book
///
/// `borrowed_at` is fixed at creation. `returned_at` moves from `None` to
/// `Some` exactly once and is never cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loan {
    /// Unique identifier
    pub id: LoanId,

    /// The borrowed book
    pub book_id: BookId,

    /// The borrowing reader
    pub reader_id: ReaderId,

    /// When the copy left the shelf (seconds since Unix epoch)
    pub borrowed_at: u64,

    /// When the copy came back, `None` while outstanding
    pub returned_at: Option<u64>,
}

impl Loan {
    /// Open a new outstanding loan
    pub fn open(id: LoanId, book_id: BookId, reader_id: ReaderId, borrowed_at: u64) -> Self {
        Self {
            id,
            book_id,
            reader_id,
            borrowed_at,
            returned_at: None,
        }
    }

    /// A loan is active until it is returned
    pub fn is_active(&self) -> bool {
        self.returned_at.is_none()
    }

    /// Record the return of this loan
    pub fn mark_returned(&mut self, at: u64) -> Result<(), LoanError> {
        if let Some(returned_at) = self.returned_at {
            return Err(LoanError::AlreadyReturned { returned_at });
        }
        self.returned_at = Some(at);
        Ok(())
    }
}

/// Query criteria for retrieving loan records
#[derive(Debug, Clone, Default)]
pub struct LoanQuery {
    /// Only loans held by this reader
    pub reader: Option<ReaderId>,

    /// Only loans of this book
    pub book: Option<BookId>,

    /// Only loans that have not been returned
    pub active_only: bool,

    /// Maximum results to return
    pub limit: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_loan() -> Loan {
        Loan::open(LoanId::new(), BookId::new(), ReaderId::new(), 1_000)
    }

    #[test]
    fn test_new_loan_is_active() {
        let loan = sample_loan();
        assert!(loan.is_active());
        assert_eq!(loan.returned_at, None);
    }

    #[test]
    fn test_return_only_once() {
        let mut loan = sample_loan();

        loan.mark_returned(2_000).unwrap();
        assert!(!loan.is_active());

        let err = loan.mark_returned(3_000).unwrap_err();
        assert_eq!(err, LoanError::AlreadyReturned { returned_at: 2_000 });
        assert_eq!(loan.returned_at, Some(2_000), "first return timestamp must stick");
        assert!(err.to_string().contains("already been returned"));
    }
}
