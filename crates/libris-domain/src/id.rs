//! Record identifiers
//!
//! Every record kind gets its own UUIDv7-backed identifier so a `BookId` can
//! never be passed where a `ReaderId` is expected. UUIDv7 keeps identifiers
//! chronologically sortable, which the store relies on for stable ordering.

use std::fmt;

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u128);

        impl $name {
            /// Generate a new UUIDv7-based identifier
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7().as_u128())
            }

            /// Create an identifier from a raw u128 value
            ///
            /// This is primarily for storage layer deserialization.
            pub fn from_value(value: u128) -> Self {
                Self(value)
            }

            /// Parse an identifier from its hyphenated UUID form
            pub fn from_string(s: &str) -> Result<Self, String> {
                uuid::Uuid::parse_str(s)
                    .map(|u| Self(u.as_u128()))
                    .map_err(|e| format!("Invalid {} '{}': {}", $label, s, e))
            }

            /// Get the raw u128 value
            pub fn value(&self) -> u128 {
                self.0
            }

            /// Big-endian byte form used as the storage key
            pub fn to_bytes(&self) -> [u8; 16] {
                self.0.to_be_bytes()
            }

            /// Rebuild an identifier from its storage key
            pub fn from_bytes(bytes: &[u8]) -> Result<Self, String> {
                let arr: [u8; 16] = bytes.try_into().map_err(|_| {
                    format!("Expected 16 bytes for {}, got {}", $label, bytes.len())
                })?;
                Ok(Self(u128::from_be_bytes(arr)))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", uuid::Uuid::from_u128(self.0))
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_string(s)
            }
        }
    };
}

record_id!(
    /// Identifier of a catalog item
    BookId,
    "book id"
);

record_id!(
    /// Identifier of a registered reader
    ReaderId,
    "reader id"
);

record_id!(
    /// Identifier of a single borrowing transaction
    LoanId,
    "loan id"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_chronological() {
        let first = LoanId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = LoanId::new();

        assert!(first < second, "Earlier UUIDv7 should sort first");
    }

    #[test]
    fn test_display_and_parse() {
        let id = BookId::new();
        let text = id.to_string();

        assert_eq!(text.len(), 36);
        assert_eq!(BookId::from_string(&text).unwrap(), id);
        assert_eq!(text.parse::<BookId>().unwrap(), id);
    }

    #[test]
    fn test_invalid_string_names_the_kind() {
        let err = ReaderId::from_string("not-a-uuid").unwrap_err();
        assert!(err.contains("reader id"));
        assert!(BookId::from_string("").is_err());
    }

    #[test]
    fn test_from_bytes_rejects_wrong_length() {
        assert!(BookId::from_bytes(&[0u8; 15]).is_err());
        let id = BookId::new();
        assert_eq!(BookId::from_bytes(&id.to_bytes()).unwrap(), id);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: ordering matches the underlying u128 ordering
        #[test]
        fn test_id_ordering_property(a: u128, b: u128) {
            let id_a = ReaderId::from_value(a);
            let id_b = ReaderId::from_value(b);

            prop_assert_eq!(id_a < id_b, a < b);
            prop_assert_eq!(id_a == id_b, a == b);
        }

        /// Property: the storage key preserves the identifier
        #[test]
        fn test_storage_key_preserves_id(value: u128) {
            let id = LoanId::from_value(value);
            prop_assert_eq!(LoanId::from_bytes(&id.to_bytes()).unwrap(), id);
        }
    }
}
