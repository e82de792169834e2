//! Book module - catalog items and their lendable stock

use crate::BookId;

/// A catalog item tracked with a count of physically available copies
///
/// `available_copies` is decremented by every borrow and incremented by every
/// return; it is never negative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    /// Unique identifier
    pub id: BookId,

    /// Title of the work
    pub title: String,

    /// Author name as printed
    pub author: String,

    /// Publication year, if known
    pub year: Option<i32>,

    /// ISBN-13, unique across the catalog when present
    pub isbn: Option<String>,

    /// Copies currently on the shelf
    pub available_copies: i64,
}

/// Field values for creating or replacing a book
///
/// Drafts are checked by the gatekeeper before they reach the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    /// Title of the work
    pub title: String,

    /// Author name as printed
    pub author: String,

    /// Publication year, if known
    pub year: Option<i32>,

    /// ISBN-13, if any
    pub isbn: Option<String>,

    /// Copies on the shelf
    pub available_copies: i64,
}

impl NewBook {
    /// Create a draft with no year or ISBN
    pub fn new(title: impl Into<String>, author: impl Into<String>, available_copies: i64) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            year: None,
            isbn: None,
            available_copies,
        }
    }

    /// Set the publication year
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// Set the ISBN
    pub fn with_isbn(mut self, isbn: impl Into<String>) -> Self {
        self.isbn = Some(isbn.into());
        self
    }

    /// Trim text fields and collapse a blank ISBN to `None`
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.author = self.author.trim().to_string();
        self.isbn = self
            .isbn
            .map(|isbn| isbn.trim().to_string())
            .filter(|isbn| !isbn.is_empty());
        self
    }

    /// Materialize the draft under the given identifier
    pub fn into_book(self, id: BookId) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            year: self.year,
            isbn: self.isbn,
            available_copies: self.available_copies,
        }
    }
}

impl Book {
    /// Whether at least one copy can be lent out
    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_drops_blank_isbn() {
        let draft = NewBook::new("  Dune ", " Frank Herbert", 2).with_isbn("   ").normalized();

        assert_eq!(draft.title, "Dune");
        assert_eq!(draft.author, "Frank Herbert");
        assert_eq!(draft.isbn, None);
    }

    #[test]
    fn test_into_book_keeps_fields() {
        let id = BookId::new();
        let book = NewBook::new("Dune", "Frank Herbert", 0)
            .with_year(1965)
            .with_isbn("9780441013593")
            .into_book(id);

        assert_eq!(book.id, id);
        assert_eq!(book.year, Some(1965));
        assert!(!book.is_available());
    }
}
