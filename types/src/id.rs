//! Identifier newtypes.
//!
//! Numeric ids are assigned by the administrative process that creates races
//! and contestants; this core only reads them. Client ids arrive opaque from
//! the request context.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TypesError;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            pub const fn get(&self) -> u64 {
                self.0
            }

            /// Big-endian encoding, so byte order matches numeric order.
            pub fn to_be_bytes(&self) -> [u8; 8] {
                self.0.to_be_bytes()
            }

            pub fn from_be_bytes(bytes: [u8; 8]) -> Self {
                Self(u64::from_be_bytes(bytes))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

numeric_id!(
    /// Identity of a race.
    RaceId
);
numeric_id!(
    /// Identity of a contestant (shared across races).
    ContestantId
);
numeric_id!(
    /// Identity of a contestant's participation in one race; the primary key
    /// of a vote-total row.
    RaceContestantId
);

/// Opaque identity of a voting client.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClientId(String);

impl ClientId {
    /// Longest accepted id, in bytes.
    pub const MAX_LEN: usize = 256;

    pub fn new(raw: impl Into<String>) -> Result<Self, TypesError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(TypesError::EmptyClientId);
        }
        if raw.len() > Self::MAX_LEN {
            return Err(TypesError::ClientIdTooLong(raw.len()));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn be_bytes_preserve_ordering() {
        let low = RaceId::new(7).to_be_bytes();
        let high = RaceId::new(256).to_be_bytes();
        assert!(low < high);
        assert_eq!(RaceId::from_be_bytes(high), RaceId::new(256));
    }

    #[test]
    fn empty_client_id_is_rejected() {
        assert_eq!(ClientId::new("  "), Err(TypesError::EmptyClientId));
        assert_eq!(ClientId::new("client-1").unwrap().as_str(), "client-1");
    }

    #[test]
    fn oversized_client_id_is_rejected() {
        assert!(ClientId::new("x".repeat(ClientId::MAX_LEN)).is_ok());
        assert_eq!(
            ClientId::new("x".repeat(ClientId::MAX_LEN + 1)),
            Err(TypesError::ClientIdTooLong(ClientId::MAX_LEN + 1))
        );
    }
}
