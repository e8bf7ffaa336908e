//! Facet counts over the post-filter, pre-pagination candidate set (spec §4.8 step 6).

use std::collections::HashMap;

use crate::model::Resource;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacetCounts {
    pub by_language: HashMap<String, usize>,
    pub by_classification: HashMap<String, usize>,
    pub by_year_bucket: HashMap<String, usize>,
    pub top_subjects: Vec<(String, usize)>,
}

/// Decade bucket label for a publication year, e.g. `2020` → `"2020s"`.
fn year_bucket(year: i32) -> String {
    format!("{}s", (year / 10) * 10)
}

pub fn compute_facets(resources: &[&Resource], top_subjects_n: usize) -> FacetCounts {
    let mut by_language = HashMap::new();
    let mut by_classification = HashMap::new();
    let mut by_year_bucket = HashMap::new();
    let mut subject_counts: HashMap<String, usize> = HashMap::new();

    for resource in resources {
        if let Some(lang) = &resource.language {
            *by_language.entry(lang.clone()).or_insert(0) += 1;
        }
        if let Some(code) = &resource.classification_code {
            *by_classification.entry(code.clone()).or_insert(0) += 1;
        }
        if let Some(year) = resource.publication_year {
            *by_year_bucket.entry(year_bucket(year)).or_insert(0) += 1;
        }
        for subject in &resource.subjects {
            *subject_counts.entry(subject.clone()).or_insert(0) += 1;
        }
    }

    let mut top_subjects: Vec<(String, usize)> = subject_counts.into_iter().collect();
    top_subjects.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_subjects.truncate(top_subjects_n);

    FacetCounts { by_language, by_classification, by_year_bucket, top_subjects }
}
