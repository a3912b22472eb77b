//! Newtype identifiers.
//!
//! Each logical top-level dispatch is tagged with a [`RequestId`] so that every
//! hop it issues (pagination continuations, rate-limit retries) can be
//! correlated in tracing output.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies one logical top-level dispatch.
///
/// Generated fresh for every call into the dispatcher; propagated through the
/// dispatch span so all hops of one call chain share the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generates a new random request identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a [`RequestId`] from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_ids_are_distinct() {
        assert_ne!(RequestId::new_random(), RequestId::new_random());
    }

    #[test]
    fn display_matches_uuid() {
        let uuid = Uuid::new_v4();
        let id = RequestId::from_uuid(uuid);
        assert_eq!(id.to_string(), uuid.to_string());
        assert_eq!(id.as_uuid(), uuid);
    }
}
