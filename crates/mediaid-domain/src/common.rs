//! Shared identifiers and search primitives.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Exposes the client-side identifier of a list entry.
pub trait Identifiable {
    fn local_id(&self) -> LocalId;
}

/// Provides read-only access to an entity's display name.
pub trait NamedEntity {
    fn name(&self) -> &str;
}

/// Temporary client-generated identifier for list entries.
///
/// Derived from a millisecond timestamp. The server ignores it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LocalId(pub u64);

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Concept Unique Identifier issued by the vocabulary behind the search endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cui(String);

impl Cui {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cui {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which vocabulary a search box queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    Medication,
    Disease,
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SearchKind::Medication => "medication",
            SearchKind::Disease => "disease",
        };
        f.write_str(label)
    }
}

/// A `{cui, name}` candidate returned by a search endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub cui: Cui,
    pub name: String,
}

impl SearchHit {
    pub fn new(cui: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            cui: Cui::new(cui),
            name: name.into(),
        }
    }
}

impl NamedEntity for SearchHit {
    fn name(&self) -> &str {
        &self.name
    }
}
