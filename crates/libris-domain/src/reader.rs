//! Reader module - registered library users

use crate::ReaderId;

/// A registered reader eligible to borrow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reader {
    /// Unique identifier
    pub id: ReaderId,

    /// Display name
    pub name: String,

    /// Contact email, unique across readers
    pub email: String,
}

/// Field values for registering or replacing a reader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReader {
    /// Display name
    pub name: String,

    /// Contact email
    pub email: String,
}

impl NewReader {
    /// Create a new reader draft
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Trim surrounding whitespace from both fields
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
        }
    }

    /// Materialize the draft under the given identifier
    pub fn into_reader(self, id: ReaderId) -> Reader {
        Reader {
            id,
            name: self.name,
            email: self.email,
        }
    }
}
