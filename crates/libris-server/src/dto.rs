//! Request and response bodies, and their conversions to domain types.
//!
//! Ids travel as UUID strings; timestamps as seconds since the Unix epoch.

use crate::error::AppError;
use libris_domain::{Book, Loan, LoanQuery, NewBook, NewReader, Reader};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Body of `POST /api/books` and `PUT /api/books/:id`
#[derive(Debug, Clone, Deserialize)]
pub struct BookPayload {
    /// Title
    #[serde(alias = "name")]
    pub title: String,
    /// Author
    pub author: String,
    /// Publication year
    #[serde(default)]
    pub year: Option<i32>,
    /// 13-digit ISBN
    #[serde(default)]
    pub isbn: Option<String>,
    /// Copies on the shelf, 1 when omitted
    #[serde(default = "default_copies", alias = "amount")]
    pub available_copies: i64,
}

fn default_copies() -> i64 {
    1
}

impl From<BookPayload> for NewBook {
    fn from(payload: BookPayload) -> Self {
        NewBook {
            title: payload.title,
            author: payload.author,
            year: payload.year,
            isbn: payload.isbn,
            available_copies: payload.available_copies,
        }
        .normalized()
    }
}

/// A book as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookResponse {
    /// Book id
    pub id: String,
    /// Title
    pub title: String,
    /// Author
    pub author: String,
    /// Publication year
    pub year: Option<i32>,
    /// ISBN
    pub isbn: Option<String>,
    /// Copies on the shelf
    pub available_copies: i64,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id.to_string(),
            title: book.title,
            author: book.author,
            year: book.year,
            isbn: book.isbn,
            available_copies: book.available_copies,
        }
    }
}

/// Body of `POST /api/readers` and `PUT /api/readers/:id`
#[derive(Debug, Clone, Deserialize)]
pub struct ReaderPayload {
    /// Display name
    pub name: String,
    /// Contact email
    pub email: String,
}

impl From<ReaderPayload> for NewReader {
    fn from(payload: ReaderPayload) -> Self {
        NewReader::new(payload.name, payload.email).normalized()
    }
}

/// A reader as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderResponse {
    /// Reader id
    pub id: String,
    /// Display name
    pub name: String,
    /// Contact email
    pub email: String,
}

impl From<Reader> for ReaderResponse {
    fn from(reader: Reader) -> Self {
        Self {
            id: reader.id.to_string(),
            name: reader.name,
            email: reader.email,
        }
    }
}

/// Body of `POST /api/loans`
#[derive(Debug, Clone, Deserialize)]
pub struct BorrowRequest {
    /// Id of the book to lend
    pub book: String,
    /// Id of the borrowing reader
    pub reader: String,
}

/// A loan as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanResponse {
    /// Loan id
    pub id: String,
    /// Borrowed book id
    pub book: String,
    /// Borrowing reader id
    pub reader: String,
    /// Borrow time
    pub borrowed_at: u64,
    /// Return time, absent while outstanding
    pub returned_at: Option<u64>,
    /// Whether the copy is still out
    pub active: bool,
}

impl From<Loan> for LoanResponse {
    fn from(loan: Loan) -> Self {
        Self {
            active: loan.is_active(),
            id: loan.id.to_string(),
            book: loan.book_id.to_string(),
            reader: loan.reader_id.to_string(),
            borrowed_at: loan.borrowed_at,
            returned_at: loan.returned_at,
        }
    }
}

/// Query string of `GET /api/loans`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoanListParams {
    /// Filter by reader id
    pub reader: Option<String>,
    /// Filter by book id
    pub book: Option<String>,
    /// Only outstanding loans
    #[serde(default)]
    pub active: bool,
    /// Maximum number of loans
    pub limit: Option<usize>,
}

impl TryFrom<LoanListParams> for LoanQuery {
    type Error = AppError;

    fn try_from(params: LoanListParams) -> Result<Self, Self::Error> {
        Ok(LoanQuery {
            reader: params.reader.as_deref().map(parse_id).transpose()?,
            book: params.book.as_deref().map(parse_id).transpose()?,
            active_only: params.active,
            limit: params.limit,
        })
    }
}

/// Body of `POST /api/token`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenRequest {
    /// Staff username
    pub username: String,
    /// Staff password
    pub password: String,
}

/// Issued bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Signed JWT
    pub token: String,
    /// Always "Bearer"
    pub token_type: String,
    /// Lifetime in seconds
    pub expires_in: u64,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Overall health status
    pub status: String,
    /// Books in the catalog
    pub books: u64,
    /// Registered readers
    pub readers: u64,
    /// Outstanding loans
    pub active_loans: u64,
}

/// Parse a path or query id, rejecting malformed input with 400
pub fn parse_id<T>(raw: &str) -> Result<T, AppError>
where
    T: FromStr<Err = String>,
{
    raw.trim().parse::<T>().map_err(AppError::BadRequest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use libris_domain::{BookId, LoanId, ReaderId};

    #[test]
    fn test_book_payload_defaults() {
        let payload: BookPayload =
            serde_json::from_str(r#"{"title": " Dune ", "author": "Frank Herbert", "isbn": ""}"#)
                .unwrap();
        let draft = NewBook::from(payload);

        assert_eq!(draft.title, "Dune");
        assert_eq!(draft.available_copies, 1);
        assert_eq!(draft.isbn, None);
        assert_eq!(draft.year, None);
    }

    #[test]
    fn test_book_payload_aliases() {
        let payload: BookPayload =
            serde_json::from_str(r#"{"name": "Emma", "author": "Jane Austen", "amount": 4}"#)
                .unwrap();
        assert_eq!(payload.title, "Emma");
        assert_eq!(payload.available_copies, 4);
    }

    #[test]
    fn test_loan_response() {
        let mut loan = Loan::open(LoanId::new(), BookId::new(), ReaderId::new(), 10);
        let response = LoanResponse::from(loan.clone());
        assert!(response.active);
        assert_eq!(response.book, loan.book_id.to_string());

        loan.mark_returned(20).unwrap();
        let response = LoanResponse::from(loan);
        assert!(!response.active);
        assert_eq!(response.returned_at, Some(20));
    }

    #[test]
    fn test_loan_params() {
        let reader = ReaderId::new();
        let params = LoanListParams {
            reader: Some(reader.to_string()),
            active: true,
            ..Default::default()
        };

        let query = LoanQuery::try_from(params).unwrap();
        assert_eq!(query.reader, Some(reader));
        assert_eq!(query.book, None);
        assert!(query.active_only);
    }

    #[test]
    fn test_bad_id_is_bad_request() {
        let params = LoanListParams {
            book: Some("42".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            LoanQuery::try_from(params),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(parse_id::<BookId>("nope"), Err(AppError::BadRequest(_))));
    }
}
