//! Type-safe entity identifiers.
//!
//! Every persisted entity gets its own newtype over the database's
//! `BIGSERIAL` key, so a booking id cannot be confused with a class id
//! at compile time. External input (path segments, request bodies) is
//! validated through `TryFrom<i64>`, which rejects zero and negative
//! values; rows read back from the store use the infallible [`new`]
//! constructor.
//!
//! [`new`]: MemberId::new

use std::fmt;

use serde::{Deserialize, Serialize};

/// Raised when an id received from a caller is zero or negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidId(pub i64);

impl fmt::Display for InvalidId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "identifier must be positive, got {}", self.0)
    }
}

impl std::error::Error for InvalidId {}

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw key read back from the store.
            #[must_use]
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Returns the raw `i64` key.
            #[must_use]
            pub const fn get(&self) -> i64 {
                self.0
            }
        }

        impl TryFrom<i64> for $name {
            type Error = InvalidId;

            fn try_from(raw: i64) -> Result<Self, Self::Error> {
                if raw > 0 {
                    Ok(Self(raw))
                } else {
                    Err(InvalidId(raw))
                }
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Identifier of a member account.
    MemberId
);
entity_id!(
    /// Identifier of a trainer.
    TrainerId
);
entity_id!(
    /// Identifier of a purchasable membership package.
    PackageId
);
entity_id!(
    /// Identifier of one purchased subscription row.
    SubscriptionId
);
entity_id!(
    /// Identifier of a scheduled fitness class.
    ClassId
);
entity_id!(
    /// Identifier of a booking row.
    BookingId
);

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn try_from_accepts_positive() {
        let id = ClassId::try_from(42);
        assert_eq!(id, Ok(ClassId::new(42)));
    }

    #[test]
    fn try_from_rejects_zero_and_negative() {
        assert_eq!(ClassId::try_from(0), Err(InvalidId(0)));
        assert_eq!(BookingId::try_from(-7), Err(InvalidId(-7)));
    }

    #[test]
    fn display_is_raw_value() {
        let id = MemberId::new(9);
        assert_eq!(format!("{id}"), "9");
    }

    #[test]
    fn serde_is_transparent() {
        let Ok(json) = serde_json::to_string(&ClassId::new(5)) else {
            panic!("serialization failed");
        };
        assert_eq!(json, "5");
        let Ok(back) = serde_json::from_str::<ClassId>("5") else {
            panic!("deserialization failed");
        };
        assert_eq!(back, ClassId::new(5));
    }

    #[test]
    fn hash_works_in_hashmap() {
        use std::collections::HashMap;
        let id = BookingId::new(1);
        let mut map = HashMap::new();
        map.insert(id, "test");
        assert_eq!(map.get(&id), Some(&"test"));
    }
}
