//! Authority & Classification (C5, spec §4.5).
//!
//! Subject canonicalization keeps the controlled vocabulary consistent
//! across resources; the rule-based classifier assigns a UDC-flat code
//! deterministically, with an optional ML multi-label classifier layered on
//! top when one is configured.

mod classify_ml;
mod classify_rule;
mod subject;

pub use classify_ml::{apply_confidence_bands, MlClassifier, TaxonomyAssignment};
pub use classify_rule::{classify, default_rules, ClassificationRule, DEFAULT_RULE_THRESHOLD};
pub use subject::{canonicalize, resolve_subject};
