//! Gatekeeper configuration

use serde::Deserialize;

/// Configuration for field validation rules
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Maximum length of a book title (characters)
    pub max_title_len: usize,

    /// Maximum length of an author name (characters)
    pub max_author_len: usize,

    /// Maximum length of a reader name (characters)
    pub max_name_len: usize,

    /// Maximum length of an email address (characters)
    pub max_email_len: usize,

    /// Look up existing ISBNs and emails before writing
    ///
    /// The store's UNIQUE constraints catch duplicates regardless; the
    /// lookup only produces a friendlier rejection.
    pub check_duplicates: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_title_len: 100,
            max_author_len: 100,
            max_name_len: 100,
            max_email_len: 255,
            check_duplicates: true,
        }
    }
}

impl ValidationConfig {
    /// Field checks only, no store lookups
    pub fn without_duplicate_checks() -> Self {
        Self {
            check_duplicates: false,
            ..Self::default()
        }
    }
}
