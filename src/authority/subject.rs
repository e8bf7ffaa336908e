//! Subject canonicalization (spec §4.5).
//!
//! `trim → collapse whitespace → case-fold → synonym table → title-case`.
//! The pipeline is deterministic: any two raw strings that agree after
//! case-folding and whitespace collapse produce the same `canonical_form`.

use crate::model::Subject;
use crate::storage::{GraphStore, StorageResult};

/// Built-in synonym table mapping a case-folded variant to its canonical
/// display form. Small and illustrative, not exhaustive — the authority
/// layer still works for terms outside this table via plain title-casing.
const SYNONYMS: &[(&str, &str)] = &[
    ("ml", "Machine Learning"),
    ("ai", "Artificial Intelligence"),
    ("nlp", "Natural Language Processing"),
    ("cv", "Computer Vision"),
    ("rl", "Reinforcement Learning"),
    ("dl", "Deep Learning"),
    ("llm", "Large Language Models"),
    ("llms", "Large Language Models"),
];

/// Reduce a raw subject string to its canonical display form.
pub fn canonicalize(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let folded = collapsed.to_lowercase();

    if let Some((_, canonical)) = SYNONYMS.iter().find(|(key, _)| *key == folded) {
        return canonical.to_string();
    }

    title_case(&collapsed)
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve `raw` against existing canonical subjects, creating a new one if
/// none matches. Increments `usage_count` and records `raw` as a variant
/// when it differs from the canonical form (spec §4.5).
pub fn resolve_subject(store: &dyn GraphStore, raw: &str) -> StorageResult<Subject> {
    let canonical_form = canonicalize(raw);
    let mut subject = match store.get_subject_by_canonical(&canonical_form)? {
        Some(existing) => existing,
        None => Subject::new(canonical_form),
    };
    subject.record_use(raw.trim());
    store.upsert_subject(&subject)?;
    Ok(subject)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{OpenStore, SqliteStore};

    #[test]
    fn canonicalize_collapses_whitespace_and_case() {
        assert_eq!(canonicalize("  machine   learning  "), "Machine Learning");
        assert_eq!(canonicalize("Machine Learning"), "Machine Learning");
    }

    #[test]
    fn canonicalize_applies_synonym_table() {
        assert_eq!(canonicalize("ML"), "Machine Learning");
        assert_eq!(canonicalize("  ml "), "Machine Learning");
    }

    #[test]
    fn canonicalize_is_idempotent() {
        let once = canonicalize("deep LEARNING");
        let twice = canonicalize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn resolve_subject_dedupes_equivalent_inputs() {
        let store = SqliteStore::open_in_memory().unwrap();
        let a = resolve_subject(&store, "Machine Learning").unwrap();
        let b = resolve_subject(&store, "  machine learning ").unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(b.usage_count, 2);
    }

    #[test]
    fn resolve_subject_records_variant() {
        let store = SqliteStore::open_in_memory().unwrap();
        resolve_subject(&store, "ML").unwrap();
        let subject = store.get_subject_by_canonical("Machine Learning").unwrap().unwrap();
        assert!(subject.variants.contains("ML"));
    }
}
