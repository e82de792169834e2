//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::{Book, BookId, Loan, LoanId, LoanQuery, NewBook, NewReader, Reader, ReaderId};

/// Trait for storing and retrieving library records
///
/// Implemented by the infrastructure layer (libris-store).
///
/// `borrow` and `return_loan` must apply their paired effects atomically:
/// a loan row never exists without the matching stock change, and vice versa.
pub trait LibraryStore {
    /// Error type for store operations
    type Error;

    /// Add a book to the catalog
    fn create_book(&mut self, draft: NewBook) -> Result<Book, Self::Error>;

    /// Get a book by ID
    fn get_book(&self, id: BookId) -> Result<Option<Book>, Self::Error>;

    /// Find the book carrying the given ISBN
    fn find_book_by_isbn(&self, isbn: &str) -> Result<Option<Book>, Self::Error>;

    /// List the whole catalog
    fn list_books(&self) -> Result<Vec<Book>, Self::Error>;

    /// Replace every field of an existing book
    fn update_book(&mut self, id: BookId, draft: NewBook) -> Result<Book, Self::Error>;

    /// Remove a book and its returned-loan history
    fn delete_book(&mut self, id: BookId) -> Result<(), Self::Error>;

    /// Register a reader
    fn create_reader(&mut self, draft: NewReader) -> Result<Reader, Self::Error>;

    /// Get a reader by ID
    fn get_reader(&self, id: ReaderId) -> Result<Option<Reader>, Self::Error>;

    /// Find the reader registered under the given email (case-insensitive)
    fn find_reader_by_email(&self, email: &str) -> Result<Option<Reader>, Self::Error>;

    /// List all readers
    fn list_readers(&self) -> Result<Vec<Reader>, Self::Error>;

    /// Replace every field of an existing reader
    fn update_reader(&mut self, id: ReaderId, draft: NewReader) -> Result<Reader, Self::Error>;

    /// Remove a reader and their returned-loan history
    fn delete_reader(&mut self, id: ReaderId) -> Result<(), Self::Error>;

    /// Lend one copy of a book to a reader
    fn borrow(&mut self, book_id: BookId, reader_id: ReaderId) -> Result<Loan, Self::Error>;

    /// Bring a borrowed copy back
    fn return_loan(&mut self, loan_id: LoanId) -> Result<Loan, Self::Error>;

    /// Get a loan by ID
    fn get_loan(&self, id: LoanId) -> Result<Option<Loan>, Self::Error>;

    /// Query loans matching criteria, oldest first
    fn query_loans(&self, query: &LoanQuery) -> Result<Vec<Loan>, Self::Error>;

    /// Books currently held by a reader, one entry per active loan
    fn active_books_for_reader(&self, reader_id: ReaderId) -> Result<Vec<Book>, Self::Error>;
}
