//! Newtype domain identifiers.
//!
//! Every Athena object that has an identity is represented as a distinct
//! newtype wrapping a primitive. This prevents accidentally interchanging (for
//! example) a [`PolicyId`] with a [`WorkspaceId`] even though both are `u64`
//! under the hood.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for u64-wrapped newtypes (server-assigned integers).
// Generates: struct (Copy), new(), as_u64(), Display, FromStr.
// ---------------------------------------------------------------------------
macro_rules! u64_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(u64);

        impl $name {
            /// Creates a new identifier from a raw integer.
            pub fn new(value: u64) -> Self {
                Self(value)
            }

            /// Returns the underlying integer value.
            pub fn as_u64(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<u64>().map(Self)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Server-assigned integers
// ---------------------------------------------------------------------------

u64_id! {
    /// Identifies an IPAM reservation.
    ///
    /// Assigned by the service when the create job succeeds; immutable afterwards.
    ReservationId
}

u64_id! {
    /// Identifies an IPAM policy (the rule set governing an allocation).
    PolicyId
}

u64_id! {
    /// Identifies a workspace: the scoping container reservations and policies
    /// belong to.
    WorkspaceId
}

u64_id! {
    /// Identifies one server-side job tracking a mutating request.
    JobId
}

// ---------------------------------------------------------------------------
// UUID-backed, generated locally
// ---------------------------------------------------------------------------

/// Correlates every request issued on behalf of one client operation.
///
/// Generated fresh per `IpamClient` call and attached to its tracing span, so
/// the submission, every status poll, and the final fetch of one job can be
/// grouped in the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationId(Uuid);

impl OperationId {
    /// Generates a new random operation identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for OperationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_bare_integers() {
        let json = serde_json::to_string(&ReservationId::new(17)).unwrap();
        assert_eq!(json, "17");

        let id: JobId = serde_json::from_str("42").unwrap();
        assert_eq!(id.as_u64(), 42);
    }

    #[test]
    fn ids_parse_from_trimmed_strings() {
        assert_eq!(" 9 ".parse::<PolicyId>().unwrap(), PolicyId::new(9));
        assert!("nine".parse::<WorkspaceId>().is_err());
    }

    #[test]
    fn operation_ids_are_unique() {
        assert_ne!(OperationId::new_random(), OperationId::new_random());
    }
}
