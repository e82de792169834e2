//! Libris Storage Layer
//!
//! Implements the `LibraryStore` trait on top of SQLite.
//!
//! # Architecture
//!
//! - One table per record kind (`books`, `readers`, `loans`)
//! - UNIQUE constraints on ISBN and reader email, foreign keys from loans to
//!   both parents
//! - Borrow, return and delete run inside `BEGIN IMMEDIATE` transactions, so
//!   the write lock is held from the moment preconditions are read until the
//!   paired effects commit. Two connections racing for the last copy of a book
//!   serialize on that lock and exactly one of them wins.
//!
//! # Examples
//!
//! ```no_run
//! use libris_domain::LendingPolicy;
//! use libris_store::SqliteStore;
//!
//! let store = SqliteStore::new("libris.db", LendingPolicy::default()).unwrap();
//! // Store is now ready for catalog and lending operations
//! ```

#![warn(missing_docs)]

mod catalog;
mod lending;

use libris_domain::traits::LibraryStore;
use libris_domain::{
    Book, BookId, LendingPolicy, Loan, LoanId, LoanQuery, NewBook, NewReader, Reader, ReaderId,
};
use rusqlite::{Connection, Row};
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Referenced record does not exist
    #[error("{0}")]
    NotFound(String),

    /// Business rule or field constraint violated
    #[error("{0}")]
    Validation(String),

    /// Operation conflicts with the current record state
    #[error("{0}")]
    Conflict(String),

    /// Stored data could not be decoded
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Record counts reported by health checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    /// Books in the catalog
    pub books: u64,
    /// Registered readers
    pub readers: u64,
    /// Loans not yet returned
    pub active_loans: u64,
}

/// SQLite-based implementation of LibraryStore
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Each thread should have its own
/// SqliteStore instance or share one behind a mutex. Several instances may
/// point at the same database file; lending consistency is enforced by
/// SQLite's locking, not by the process.
pub struct SqliteStore {
    conn: Connection,
    policy: LendingPolicy,
}

/// Default time a writer waits for a competing transaction to finish
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

impl SqliteStore {
    /// Open (or create) a store at the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P, policy: LendingPolicy) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
        let mut store = Self { conn, policy };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open a private in-memory store with the default lending policy
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::new(":memory:", LendingPolicy::default())
    }

    /// Override how long a writer waits on a locked database
    pub fn with_busy_timeout(self, timeout: Duration) -> Result<Self, StoreError> {
        self.conn.busy_timeout(timeout)?;
        Ok(self)
    }

    /// The lending policy enforced by `borrow`
    pub fn policy(&self) -> LendingPolicy {
        self.policy
    }

    /// Initialize the database schema
    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    /// Count records for health reporting
    pub fn stats(&self) -> Result<StoreStats, StoreError> {
        let count = |sql: &str| -> Result<u64, StoreError> {
            let n: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
            Ok(n as u64)
        };

        Ok(StoreStats {
            books: count("SELECT COUNT(*) FROM books")?,
            readers: count("SELECT COUNT(*) FROM readers")?,
            active_loans: count("SELECT COUNT(*) FROM loans WHERE returned_at IS NULL")?,
        })
    }
}

/// Current timestamp in seconds since Unix epoch
pub(crate) fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Wrap an id decoding failure as a column conversion error
fn decode_failure(column: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Blob,
        Box::new(StoreError::InvalidData(message)),
    )
}

pub(crate) const BOOK_COLUMNS: &str = "id, title, author, year, isbn, available_copies";
pub(crate) const READER_COLUMNS: &str = "id, name, email";
pub(crate) const LOAN_COLUMNS: &str = "id, book_id, reader_id, borrowed_at, returned_at";

pub(crate) fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    let id_bytes: Vec<u8> = row.get(0)?;
    let id = BookId::from_bytes(&id_bytes).map_err(|e| decode_failure(0, e))?;

    Ok(Book {
        id,
        title: row.get(1)?,
        author: row.get(2)?,
        year: row.get(3)?,
        isbn: row.get(4)?,
        available_copies: row.get(5)?,
    })
}

pub(crate) fn reader_from_row(row: &Row<'_>) -> rusqlite::Result<Reader> {
    let id_bytes: Vec<u8> = row.get(0)?;
    let id = ReaderId::from_bytes(&id_bytes).map_err(|e| decode_failure(0, e))?;

    Ok(Reader {
        id,
        name: row.get(1)?,
        email: row.get(2)?,
    })
}

pub(crate) fn loan_from_row(row: &Row<'_>) -> rusqlite::Result<Loan> {
    let id_bytes: Vec<u8> = row.get(0)?;
    let book_bytes: Vec<u8> = row.get(1)?;
    let reader_bytes: Vec<u8> = row.get(2)?;
    let returned_at: Option<i64> = row.get(4)?;

    Ok(Loan {
        id: LoanId::from_bytes(&id_bytes).map_err(|e| decode_failure(0, e))?,
        book_id: BookId::from_bytes(&book_bytes).map_err(|e| decode_failure(1, e))?,
        reader_id: ReaderId::from_bytes(&reader_bytes).map_err(|e| decode_failure(2, e))?,
        borrowed_at: row.get::<_, i64>(3)? as u64,
        returned_at: returned_at.map(|t| t as u64),
    })
}

impl LibraryStore for SqliteStore {
    type Error = StoreError;

    fn create_book(&mut self, draft: NewBook) -> Result<Book, Self::Error> {
        self.insert_book(draft)
    }

    fn get_book(&self, id: BookId) -> Result<Option<Book>, Self::Error> {
        self.select_book(id)
    }

    fn find_book_by_isbn(&self, isbn: &str) -> Result<Option<Book>, Self::Error> {
        self.select_book_by_isbn(isbn)
    }

    fn list_books(&self) -> Result<Vec<Book>, Self::Error> {
        self.select_books()
    }

    fn update_book(&mut self, id: BookId, draft: NewBook) -> Result<Book, Self::Error> {
        self.replace_book(id, draft)
    }

    fn delete_book(&mut self, id: BookId) -> Result<(), Self::Error> {
        self.remove_book(id)
    }

    fn create_reader(&mut self, draft: NewReader) -> Result<Reader, Self::Error> {
        self.insert_reader(draft)
    }

    fn get_reader(&self, id: ReaderId) -> Result<Option<Reader>, Self::Error> {
        self.select_reader(id)
    }

    fn find_reader_by_email(&self, email: &str) -> Result<Option<Reader>, Self::Error> {
        self.select_reader_by_email(email)
    }

    fn list_readers(&self) -> Result<Vec<Reader>, Self::Error> {
        self.select_readers()
    }

    fn update_reader(&mut self, id: ReaderId, draft: NewReader) -> Result<Reader, Self::Error> {
        self.replace_reader(id, draft)
    }

    fn delete_reader(&mut self, id: ReaderId) -> Result<(), Self::Error> {
        self.remove_reader(id)
    }

    fn borrow(&mut self, book_id: BookId, reader_id: ReaderId) -> Result<Loan, Self::Error> {
        self.borrow_copy(book_id, reader_id)
    }

    fn return_loan(&mut self, loan_id: LoanId) -> Result<Loan, Self::Error> {
        self.return_copy(loan_id)
    }

    fn get_loan(&self, id: LoanId) -> Result<Option<Loan>, Self::Error> {
        self.select_loan(id)
    }

    fn query_loans(&self, query: &LoanQuery) -> Result<Vec<Loan>, Self::Error> {
        self.select_loans(query)
    }

    fn active_books_for_reader(&self, reader_id: ReaderId) -> Result<Vec<Book>, Self::Error> {
        self.select_active_books(reader_id)
    }
}
