//! Shared identifier types

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Correlation token for one pending invocation
///
/// Serialized as a bare UUID string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvocationId(Uuid);

impl InvocationId {
    /// Generate a fresh random (v4) id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an id as sent back by the plugin
    ///
    /// Returns `None` for anything that is not a UUID; callers treat that as
    /// an unknown id.
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s.trim()).ok().map(Self)
    }
}

impl Default for InvocationId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for InvocationId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for InvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
