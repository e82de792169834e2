//! Book and reader records

use crate::{
    book_from_row, reader_from_row, SqliteStore, StoreError, BOOK_COLUMNS, READER_COLUMNS,
};
use libris_domain::{Book, BookId, NewBook, NewReader, Reader, ReaderId};
use rusqlite::{ffi, params, OptionalExtension, TransactionBehavior};
use tracing::{debug, info};

/// Whether a write failed on the given SQLite constraint kind
fn violates(err: &rusqlite::Error, extended_code: std::os::raw::c_int) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.extended_code == extended_code)
}

fn book_write_error(err: rusqlite::Error, book: &Book) -> StoreError {
    if violates(&err, ffi::SQLITE_CONSTRAINT_UNIQUE) {
        return StoreError::Validation(format!(
            "A book with ISBN {} already exists",
            book.isbn.as_deref().unwrap_or_default()
        ));
    }
    if violates(&err, ffi::SQLITE_CONSTRAINT_CHECK) {
        return StoreError::Validation(
            "Title and author are required and the number of copies cannot be negative"
                .to_string(),
        );
    }
    StoreError::Database(err)
}

fn reader_write_error(err: rusqlite::Error, reader: &Reader) -> StoreError {
    if violates(&err, ffi::SQLITE_CONSTRAINT_UNIQUE) {
        return StoreError::Validation(format!(
            "A reader with email {} already exists",
            reader.email
        ));
    }
    if violates(&err, ffi::SQLITE_CONSTRAINT_CHECK) {
        return StoreError::Validation("Reader name is required".to_string());
    }
    StoreError::Database(err)
}

impl SqliteStore {
    pub(crate) fn insert_book(&mut self, draft: NewBook) -> Result<Book, StoreError> {
        let book = draft.into_book(BookId::new());

        self.conn
            .execute(
                "INSERT INTO books (id, title, author, year, isbn, available_copies)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    book.id.to_bytes().to_vec(),
                    &book.title,
                    &book.author,
                    book.year,
                    &book.isbn,
                    book.available_copies,
                ],
            )
            .map_err(|e| book_write_error(e, &book))?;

        info!(book_id = %book.id, title = %book.title, copies = book.available_copies, "Book added to catalog");
        Ok(book)
    }

    pub(crate) fn select_book(&self, id: BookId) -> Result<Option<Book>, StoreError> {
        let book = self
            .conn
            .query_row(
                &format!("SELECT {} FROM books WHERE id = ?1", BOOK_COLUMNS),
                params![id.to_bytes().to_vec()],
                book_from_row,
            )
            .optional()?;

        Ok(book)
    }

    pub(crate) fn select_book_by_isbn(&self, isbn: &str) -> Result<Option<Book>, StoreError> {
        let book = self
            .conn
            .query_row(
                &format!("SELECT {} FROM books WHERE isbn = ?1", BOOK_COLUMNS),
                params![isbn],
                book_from_row,
            )
            .optional()?;

        Ok(book)
    }

    pub(crate) fn select_books(&self) -> Result<Vec<Book>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM books ORDER BY id", BOOK_COLUMNS))?;
        let books = stmt
            .query_map([], book_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        debug!(count = books.len(), "Listed catalog");
        Ok(books)
    }

    pub(crate) fn replace_book(&mut self, id: BookId, draft: NewBook) -> Result<Book, StoreError> {
        let book = draft.into_book(id);

        let updated = self
            .conn
            .execute(
                "UPDATE books SET title = ?2, author = ?3, year = ?4, isbn = ?5, available_copies = ?6
                 WHERE id = ?1",
                params![
                    book.id.to_bytes().to_vec(),
                    &book.title,
                    &book.author,
                    book.year,
                    &book.isbn,
                    book.available_copies,
                ],
            )
            .map_err(|e| book_write_error(e, &book))?;

        if updated == 0 {
            return Err(StoreError::NotFound(format!("Book not found: {}", id)));
        }

        info!(book_id = %id, "Book updated");
        Ok(book)
    }

    /// Delete a book together with its returned-loan history
    ///
    /// Refused with `Conflict` while any copy is still out on loan.
    pub(crate) fn remove_book(&mut self, id: BookId) -> Result<(), StoreError> {
        self.remove_with_history("books", "book_id", id.to_bytes().to_vec(), &format!("Book {}", id))
    }

    pub(crate) fn insert_reader(&mut self, draft: NewReader) -> Result<Reader, StoreError> {
        let reader = draft.into_reader(ReaderId::new());

        self.conn
            .execute(
                "INSERT INTO readers (id, name, email) VALUES (?1, ?2, ?3)",
                params![reader.id.to_bytes().to_vec(), &reader.name, &reader.email],
            )
            .map_err(|e| reader_write_error(e, &reader))?;

        info!(reader_id = %reader.id, "Reader registered");
        Ok(reader)
    }

    pub(crate) fn select_reader(&self, id: ReaderId) -> Result<Option<Reader>, StoreError> {
        let reader = self
            .conn
            .query_row(
                &format!("SELECT {} FROM readers WHERE id = ?1", READER_COLUMNS),
                params![id.to_bytes().to_vec()],
                reader_from_row,
            )
            .optional()?;

        Ok(reader)
    }

    pub(crate) fn select_reader_by_email(&self, email: &str) -> Result<Option<Reader>, StoreError> {
        // email carries COLLATE NOCASE, so this comparison ignores case
        let reader = self
            .conn
            .query_row(
                &format!("SELECT {} FROM readers WHERE email = ?1", READER_COLUMNS),
                params![email],
                reader_from_row,
            )
            .optional()?;

        Ok(reader)
    }

    pub(crate) fn select_readers(&self) -> Result<Vec<Reader>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM readers ORDER BY id", READER_COLUMNS))?;
        let readers = stmt
            .query_map([], reader_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(readers)
    }

    pub(crate) fn replace_reader(
        &mut self,
        id: ReaderId,
        draft: NewReader,
    ) -> Result<Reader, StoreError> {
        let reader = draft.into_reader(id);

        let updated = self
            .conn
            .execute(
                "UPDATE readers SET name = ?2, email = ?3 WHERE id = ?1",
                params![reader.id.to_bytes().to_vec(), &reader.name, &reader.email],
            )
            .map_err(|e| reader_write_error(e, &reader))?;

        if updated == 0 {
            return Err(StoreError::NotFound(format!("Reader not found: {}", id)));
        }

        info!(reader_id = %id, "Reader updated");
        Ok(reader)
    }

    /// Delete a reader together with their returned-loan history
    ///
    /// Refused with `Conflict` while the reader still holds a book.
    pub(crate) fn remove_reader(&mut self, id: ReaderId) -> Result<(), StoreError> {
        self.remove_with_history(
            "readers",
            "reader_id",
            id.to_bytes().to_vec(),
            &format!("Reader {}", id),
        )
    }

    fn remove_with_history(
        &mut self,
        table: &str,
        loan_column: &str,
        key: Vec<u8>,
        label: &str,
    ) -> Result<(), StoreError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let exists = tx
            .query_row(
                &format!("SELECT 1 FROM {} WHERE id = ?1", table),
                params![&key],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !exists {
            return Err(StoreError::NotFound(format!("{} not found", label)));
        }

        let active: i64 = tx.query_row(
            &format!(
                "SELECT COUNT(*) FROM loans WHERE {} = ?1 AND returned_at IS NULL",
                loan_column
            ),
            params![&key],
            |row| row.get(0),
        )?;
        if active > 0 {
            return Err(StoreError::Conflict(format!(
                "{} cannot be deleted while {} loan(s) are outstanding",
                label, active
            )));
        }

        let history = tx.execute(
            &format!("DELETE FROM loans WHERE {} = ?1", loan_column),
            params![&key],
        )?;
        tx.execute(&format!("DELETE FROM {} WHERE id = ?1", table), params![&key])?;
        tx.commit()?;

        info!(record = %label, loans_removed = history, "Record deleted");
        Ok(())
    }
}
