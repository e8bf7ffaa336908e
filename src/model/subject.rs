//! Subject (Authority) — canonical topic label (spec §3, §4.5).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SubjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A canonicalized topic label shared across resources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub canonical_form: String,
    pub variants: BTreeSet<String>,
    pub usage_count: u64,
}

impl Subject {
    pub fn new(canonical_form: impl Into<String>) -> Self {
        Self {
            id: SubjectId::new(),
            canonical_form: canonical_form.into(),
            variants: BTreeSet::new(),
            usage_count: 0,
        }
    }

    /// Record one more use of this subject, registering `variant` if new
    /// and distinct from the canonical form.
    pub fn record_use(&mut self, variant: &str) {
        self.usage_count += 1;
        if variant != self.canonical_form {
            self.variants.insert(variant.to_string());
        }
    }
}
