//! Field validation for books and readers

use crate::{GatekeeperError, ValidationConfig};
use libris_domain::traits::LibraryStore;
use libris_domain::{BookId, NewBook, NewReader, ReaderId};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Required length of an ISBN
pub const ISBN_LENGTH: usize = 13;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .expect("email pattern compiles")
});

/// Result of validating a draft
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether the draft passed validation
    pub status: ValidationStatus,

    /// Rejection reasons (if any)
    pub reasons: Vec<RejectionReason>,
}

/// Validation status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStatus {
    /// Draft accepted
    Accepted,

    /// Draft rejected
    Rejected,
}

/// Reasons for rejection
#[derive(Debug, Clone, PartialEq)]
pub enum RejectionReason {
    /// A required text field is blank
    EmptyField {
        /// Field name
        field: &'static str,
    },

    /// A text field exceeds its maximum length
    TooLong {
        /// Field name
        field: &'static str,
        /// Maximum allowed characters
        max: usize,
        /// Actual characters
        actual: usize,
    },

    /// ISBN is not 13 digits
    InvalidIsbn(String),

    /// Copy count below zero
    NegativeCopies(i64),

    /// Email address is malformed
    InvalidEmail(String),

    /// Another book already carries this ISBN
    DuplicateIsbn {
        /// The ISBN in question
        isbn: String,
        /// ID of the existing book
        existing_id: BookId,
    },

    /// Another reader is registered under this email
    DuplicateEmail {
        /// The email in question
        email: String,
        /// ID of the existing reader
        existing_id: ReaderId,
    },
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::EmptyField { field } => write!(f, "{} cannot be empty", field),
            RejectionReason::TooLong { field, max, actual } => write!(
                f,
                "{} is too long ({} characters, max {})",
                field, actual, max
            ),
            RejectionReason::InvalidIsbn(isbn) => write!(
                f,
                "ISBN '{}' must consist of exactly {} digits",
                isbn, ISBN_LENGTH
            ),
            RejectionReason::NegativeCopies(n) => {
                write!(f, "Number of copies cannot be negative (got {})", n)
            }
            RejectionReason::InvalidEmail(email) => {
                write!(f, "Enter a valid email address (got '{}')", email)
            }
            RejectionReason::DuplicateIsbn { isbn, .. } => {
                write!(f, "A book with ISBN {} already exists", isbn)
            }
            RejectionReason::DuplicateEmail { email, .. } => {
                write!(f, "A reader with email {} already exists", email)
            }
        }
    }
}

impl ValidationResult {
    fn from_reasons(reasons: Vec<RejectionReason>) -> Self {
        let status = if reasons.is_empty() {
            ValidationStatus::Accepted
        } else {
            ValidationStatus::Rejected
        };
        Self { status, reasons }
    }

    /// Whether the draft may be persisted
    pub fn is_accepted(&self) -> bool {
        self.status == ValidationStatus::Accepted
    }

    /// All rejection messages joined into one line
    pub fn message(&self) -> String {
        self.reasons
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// The Gatekeeper validates drafts before storage
pub struct Gatekeeper {
    config: ValidationConfig,
}

impl Gatekeeper {
    /// Create a new Gatekeeper with the given configuration
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Create a Gatekeeper with default configuration
    pub fn default_config() -> Self {
        Self::new(ValidationConfig::default())
    }

    /// Validate a book draft
    ///
    /// # Arguments
    ///
    /// * `draft` - The book fields to validate (expected to be normalized)
    /// * `current` - ID of the book being replaced, so its own ISBN is not a duplicate
    /// * `store` - The store for duplicate detection (optional)
    pub fn validate_book<S: LibraryStore>(
        &self,
        draft: &NewBook,
        current: Option<BookId>,
        store: Option<&S>,
    ) -> Result<ValidationResult, GatekeeperError>
    where
        S::Error: fmt::Display,
    {
        let mut reasons = Vec::new();

        reasons.extend(check_text("title", &draft.title, self.config.max_title_len));
        reasons.extend(check_text("author", &draft.author, self.config.max_author_len));

        if draft.available_copies < 0 {
            reasons.push(RejectionReason::NegativeCopies(draft.available_copies));
        }

        if let Some(isbn) = &draft.isbn {
            if !is_valid_isbn(isbn) {
                reasons.push(RejectionReason::InvalidIsbn(isbn.clone()));
            } else if self.config.check_duplicates {
                if let Some(store) = store {
                    let existing = store
                        .find_book_by_isbn(isbn)
                        .map_err(|e| GatekeeperError::Store(format!("Failed to look up ISBN: {}", e)))?;
                    if let Some(existing) = existing.filter(|b| Some(b.id) != current) {
                        reasons.push(RejectionReason::DuplicateIsbn {
                            isbn: isbn.clone(),
                            existing_id: existing.id,
                        });
                    }
                }
            }
        }

        let result = ValidationResult::from_reasons(reasons);
        if !result.is_accepted() {
            tracing::debug!(title = %draft.title, reasons = %result.message(), "Book draft rejected");
        }
        Ok(result)
    }

    /// Validate a reader draft
    ///
    /// `current` is the reader being replaced, so their own email is not a
    /// duplicate.
    pub fn validate_reader<S: LibraryStore>(
        &self,
        draft: &NewReader,
        current: Option<ReaderId>,
        store: Option<&S>,
    ) -> Result<ValidationResult, GatekeeperError>
    where
        S::Error: fmt::Display,
    {
        let mut reasons = Vec::new();

        reasons.extend(check_text("name", &draft.name, self.config.max_name_len));

        let email_len = draft.email.chars().count();
        if draft.email.is_empty() {
            reasons.push(RejectionReason::EmptyField { field: "email" });
        } else if email_len > self.config.max_email_len {
            reasons.push(RejectionReason::TooLong {
                field: "email",
                max: self.config.max_email_len,
                actual: email_len,
            });
        } else if !is_valid_email(&draft.email) {
            reasons.push(RejectionReason::InvalidEmail(draft.email.clone()));
        } else if self.config.check_duplicates {
            if let Some(store) = store {
                let existing = store
                    .find_reader_by_email(&draft.email)
                    .map_err(|e| GatekeeperError::Store(format!("Failed to look up email: {}", e)))?;
                if let Some(existing) = existing.filter(|r| Some(r.id) != current) {
                    reasons.push(RejectionReason::DuplicateEmail {
                        email: draft.email.clone(),
                        existing_id: existing.id,
                    });
                }
            }
        }

        let result = ValidationResult::from_reasons(reasons);
        if !result.is_accepted() {
            tracing::debug!(reasons = %result.message(), "Reader draft rejected");
        }
        Ok(result)
    }
}

/// Required, length-limited text field
fn check_text(field: &'static str, value: &str, max: usize) -> Option<RejectionReason> {
    if value.trim().is_empty() {
        return Some(RejectionReason::EmptyField { field });
    }

    let actual = value.chars().count();
    if actual > max {
        return Some(RejectionReason::TooLong { field, max, actual });
    }

    None
}

/// Whether `isbn` is exactly 13 ASCII digits
pub fn is_valid_isbn(isbn: &str) -> bool {
    isbn.len() == ISBN_LENGTH && isbn.bytes().all(|b| b.is_ascii_digit())
}

/// Whether `email` looks like `local@domain.tld`
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use libris_store::SqliteStore;

    fn valid_book() -> NewBook {
        NewBook::new("Test Book", "Test Author", 3)
            .with_year(2020)
            .with_isbn("1234567890123")
    }

    fn no_store() -> Option<&'static SqliteStore> {
        None
    }

    #[test]
    fn test_valid_book() {
        let gatekeeper = Gatekeeper::default_config();
        let result = gatekeeper.validate_book(&valid_book(), None, no_store()).unwrap();

        assert_eq!(result.status, ValidationStatus::Accepted);
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn test_empty_title_and_author() {
        let gatekeeper = Gatekeeper::default_config();
        let mut draft = valid_book();
        draft.title = "   ".to_string();
        draft.author = String::new();

        let result = gatekeeper.validate_book(&draft, None, no_store()).unwrap();

        assert_eq!(result.status, ValidationStatus::Rejected);
        assert_eq!(
            result.reasons,
            vec![
                RejectionReason::EmptyField { field: "title" },
                RejectionReason::EmptyField { field: "author" },
            ]
        );
    }

    #[test]
    fn test_title_too_long() {
        let gatekeeper = Gatekeeper::default_config();
        let mut draft = valid_book();
        draft.title = "x".repeat(101);

        let result = gatekeeper.validate_book(&draft, None, no_store()).unwrap();

        match &result.reasons[0] {
            RejectionReason::TooLong { field, max, actual } => {
                assert_eq!(*field, "title");
                assert_eq!(*max, 100);
                assert_eq!(*actual, 101);
            }
            other => panic!("Expected TooLong, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_copies() {
        let gatekeeper = Gatekeeper::default_config();
        let mut draft = valid_book();
        draft.available_copies = -2;

        let result = gatekeeper.validate_book(&draft, None, no_store()).unwrap();

        assert_eq!(result.reasons, vec![RejectionReason::NegativeCopies(-2)]);
        assert!(result.message().contains("cannot be negative"));
    }

    #[test]
    fn test_isbn_format() {
        assert!(is_valid_isbn("9780441013593"));
        assert!(!is_valid_isbn("978044101359"));
        assert!(!is_valid_isbn("97804410135930"));
        assert!(!is_valid_isbn("978-044101359"));
        assert!(!is_valid_isbn("978044101359X"));
    }

    #[test]
    fn test_email_format() {
        assert!(is_valid_email("reader@example.com"));
        assert!(is_valid_email("first.last+tag@mail.example.org"));
        assert!(!is_valid_email("reader@"));
        assert!(!is_valid_email("reader.example.com"));
        assert!(!is_valid_email("reader@example"));
        assert!(!is_valid_email("two words@example.com"));
    }

    #[test]
    fn test_invalid_reader() {
        let gatekeeper = Gatekeeper::default_config();
        let draft = NewReader::new("", "not-an-email");

        let result = gatekeeper.validate_reader(&draft, None, no_store()).unwrap();

        assert_eq!(result.status, ValidationStatus::Rejected);
        assert_eq!(result.reasons.len(), 2);
        assert!(matches!(result.reasons[1], RejectionReason::InvalidEmail(_)));
    }

    #[test]
    fn test_duplicate_isbn_detected() {
        let mut store = SqliteStore::in_memory().unwrap();
        let existing = store.create_book(valid_book()).unwrap();
        let gatekeeper = Gatekeeper::default_config();

        let result = gatekeeper.validate_book(&valid_book(), None, Some(&store)).unwrap();
        assert_eq!(
            result.reasons,
            vec![RejectionReason::DuplicateIsbn {
                isbn: "1234567890123".to_string(),
                existing_id: existing.id,
            }]
        );

        // replacing the same book keeps its own ISBN
        let result = gatekeeper
            .validate_book(&valid_book(), Some(existing.id), Some(&store))
            .unwrap();
        assert!(result.is_accepted());
    }

    #[test]
    fn test_duplicate_email_detected_case_insensitive() {
        let mut store = SqliteStore::in_memory().unwrap();
        let existing = store
            .create_reader(NewReader::new("Reader", "reader@example.com"))
            .unwrap();
        let gatekeeper = Gatekeeper::default_config();

        let draft = NewReader::new("Other", "Reader@Example.com");
        let result = gatekeeper.validate_reader(&draft, None, Some(&store)).unwrap();

        match &result.reasons[0] {
            RejectionReason::DuplicateEmail { existing_id, .. } => {
                assert_eq!(*existing_id, existing.id)
            }
            other => panic!("Expected DuplicateEmail, got {:?}", other),
        }

        let result = gatekeeper
            .validate_reader(&draft, Some(existing.id), Some(&store))
            .unwrap();
        assert!(result.is_accepted());
    }

    #[test]
    fn test_duplicate_checks_can_be_disabled() {
        let mut store = SqliteStore::in_memory().unwrap();
        store.create_book(valid_book()).unwrap();
        let gatekeeper = Gatekeeper::new(ValidationConfig::without_duplicate_checks());

        let result = gatekeeper.validate_book(&valid_book(), None, Some(&store)).unwrap();
        assert!(result.is_accepted());
    }
}
