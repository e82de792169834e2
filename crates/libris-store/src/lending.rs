//! Borrowing and returning
//!
//! Both operations follow the same shape: take the write lock with
//! `BEGIN IMMEDIATE`, read the preconditions, apply the loan row change and the
//! stock change, commit. Any early return drops the transaction, which rolls
//! back everything done so far.

use crate::{
    book_from_row, current_timestamp, loan_from_row, SqliteStore, StoreError, LOAN_COLUMNS,
};
use libris_domain::{Book, BookId, BorrowRejection, Loan, LoanId, LoanQuery, ReaderId};
use rusqlite::{params, OptionalExtension, TransactionBehavior};
use tracing::{debug, info, warn};

impl SqliteStore {
    pub(crate) fn borrow_copy(
        &mut self,
        book_id: BookId,
        reader_id: ReaderId,
    ) -> Result<Loan, StoreError> {
        let policy = self.policy;
        let book_key = book_id.to_bytes().to_vec();
        let reader_key = reader_id.to_bytes().to_vec();

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let available: i64 = tx
            .query_row(
                "SELECT available_copies FROM books WHERE id = ?1",
                params![&book_key],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("Book not found: {}", book_id)))?;

        let reader_known = tx
            .query_row(
                "SELECT 1 FROM readers WHERE id = ?1",
                params![&reader_key],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !reader_known {
            return Err(StoreError::NotFound(format!("Reader not found: {}", reader_id)));
        }

        let active_loans: u32 = tx.query_row(
            "SELECT COUNT(*) FROM loans WHERE reader_id = ?1 AND returned_at IS NULL",
            params![&reader_key],
            |row| row.get(0),
        )?;

        if let Err(rejection) = policy.check_borrow(available, active_loans) {
            warn!(%book_id, %reader_id, available, active_loans, %rejection, "Borrow refused");
            return Err(StoreError::Validation(rejection.to_string()));
        }

        let loan = Loan::open(LoanId::new(), book_id, reader_id, current_timestamp());
        tx.execute(
            "INSERT INTO loans (id, book_id, reader_id, borrowed_at, returned_at)
             VALUES (?1, ?2, ?3, ?4, NULL)",
            params![
                loan.id.to_bytes().to_vec(),
                &book_key,
                &reader_key,
                loan.borrowed_at as i64,
            ],
        )?;

        let taken = tx.execute(
            "UPDATE books SET available_copies = available_copies - 1
             WHERE id = ?1 AND available_copies > 0",
            params![&book_key],
        )?;
        if taken != 1 {
            return Err(StoreError::Validation(BorrowRejection::OutOfStock.to_string()));
        }

        tx.commit()?;

        info!(loan_id = %loan.id, %book_id, %reader_id, copies_left = available - 1, "Book borrowed");
        Ok(loan)
    }

    pub(crate) fn return_copy(&mut self, loan_id: LoanId) -> Result<Loan, StoreError> {
        let loan_key = loan_id.to_bytes().to_vec();

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut loan = tx
            .query_row(
                &format!("SELECT {} FROM loans WHERE id = ?1", LOAN_COLUMNS),
                params![&loan_key],
                loan_from_row,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("Loan not found: {}", loan_id)))?;

        if let Err(e) = loan.mark_returned(current_timestamp()) {
            warn!(%loan_id, "Return refused: loan already closed");
            return Err(StoreError::Conflict(e.to_string()));
        }

        let closed = tx.execute(
            "UPDATE loans SET returned_at = ?2 WHERE id = ?1 AND returned_at IS NULL",
            params![&loan_key, loan.returned_at.map(|t| t as i64)],
        )?;
        if closed != 1 {
            return Err(StoreError::Conflict(
                "This book has already been returned".to_string(),
            ));
        }

        let restocked = tx.execute(
            "UPDATE books SET available_copies = available_copies + 1 WHERE id = ?1",
            params![loan.book_id.to_bytes().to_vec()],
        )?;
        if restocked != 1 {
            return Err(StoreError::NotFound(format!(
                "Book not found: {}",
                loan.book_id
            )));
        }

        tx.commit()?;

        info!(%loan_id, book_id = %loan.book_id, reader_id = %loan.reader_id, "Book returned");
        Ok(loan)
    }

    pub(crate) fn select_loan(&self, id: LoanId) -> Result<Option<Loan>, StoreError> {
        let loan = self
            .conn
            .query_row(
                &format!("SELECT {} FROM loans WHERE id = ?1", LOAN_COLUMNS),
                params![id.to_bytes().to_vec()],
                loan_from_row,
            )
            .optional()?;

        Ok(loan)
    }

    pub(crate) fn select_loans(&self, query: &LoanQuery) -> Result<Vec<Loan>, StoreError> {
        let mut sql = format!("SELECT {} FROM loans WHERE 1=1", LOAN_COLUMNS);
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(reader) = query.reader {
            sql.push_str(" AND reader_id = ?");
            params.push(Box::new(reader.to_bytes().to_vec()));
        }

        if let Some(book) = query.book {
            sql.push_str(" AND book_id = ?");
            params.push(Box::new(book.to_bytes().to_vec()));
        }

        if query.active_only {
            sql.push_str(" AND returned_at IS NULL");
        }

        sql.push_str(" ORDER BY borrowed_at, id");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            params.push(Box::new(limit as i64));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let loans = stmt
            .query_map(&param_refs[..], loan_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        debug!(count = loans.len(), "Queried loans");
        Ok(loans)
    }

    pub(crate) fn select_active_books(&self, reader_id: ReaderId) -> Result<Vec<Book>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT b.id, b.title, b.author, b.year, b.isbn, b.available_copies
             FROM loans l JOIN books b ON b.id = l.book_id
             WHERE l.reader_id = ?1 AND l.returned_at IS NULL
             ORDER BY l.borrowed_at, l.id",
        )?;

        let books = stmt
            .query_map(params![reader_id.to_bytes().to_vec()], book_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(books)
    }
}
