//! User profile vector and seed keywords (spec §4.10 steps 1–2).

use crate::model::{Resource, Subject};

const MIN_RESOURCES_FOR_PROFILE: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum ProfileError {
    InsufficientLibrary,
}

/// Top-`profile_size` resources by `quality_overall` that carry an
/// embedding, L2-normalized mean. Spec §4.10: fewer than 3 eligible
/// resources ⇒ `InsufficientLibrary`.
pub fn build_profile(resources: &[Resource], profile_size: usize) -> Result<Vec<f32>, ProfileError> {
    let mut eligible: Vec<&Resource> = resources.iter().filter(|r| r.embedding.is_some()).collect();
    if eligible.len() < MIN_RESOURCES_FOR_PROFILE {
        return Err(ProfileError::InsufficientLibrary);
    }

    eligible.sort_by(|a, b| b.quality_overall.partial_cmp(&a.quality_overall).unwrap_or(std::cmp::Ordering::Equal));
    eligible.truncate(profile_size);

    let dimension = eligible[0].embedding.as_ref().unwrap().len();
    let mut mean = vec![0.0f32; dimension];
    for resource in &eligible {
        if let Some(embedding) = &resource.embedding {
            for (slot, value) in mean.iter_mut().zip(embedding) {
                *slot += value;
            }
        }
    }
    let n = eligible.len() as f32;
    for value in mean.iter_mut() {
        *value /= n;
    }

    let norm: f32 = mean.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in mean.iter_mut() {
            *value /= norm;
        }
    }
    Ok(mean)
}

/// Top-`k` canonical subjects by `usage_count × average quality_overall` of
/// the resources that carry them (spec §4.10 step 2).
pub fn seed_keywords(subjects: &[Subject], resources: &[Resource], k: usize) -> Vec<String> {
    let mut scored: Vec<(String, f32)> = subjects
        .iter()
        .map(|subject| {
            let carriers: Vec<&Resource> = resources.iter().filter(|r| r.subjects.contains(&subject.canonical_form)).collect();
            let avg_quality = if carriers.is_empty() {
                0.0
            } else {
                carriers.iter().map(|r| r.quality_overall).sum::<f32>() / carriers.len() as f32
            };
            (subject.canonical_form.clone(), subject.usage_count as f32 * avg_quality)
        })
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(k);
    scored.into_iter().map(|(name, _)| name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Resource;

    fn resource_with(quality: f32, embedding: Option<Vec<f32>>) -> Resource {
        let mut r = Resource::new("https://example.com");
        r.quality_overall = quality;
        r.embedding = embedding;
        r
    }

    #[test]
    fn profile_requires_minimum_eligible_resources() {
        let resources = vec![resource_with(0.9, Some(vec![1.0, 0.0])), resource_with(0.8, Some(vec![0.0, 1.0]))];
        assert_eq!(build_profile(&resources, 50), Err(ProfileError::InsufficientLibrary));
    }

    #[test]
    fn profile_is_unit_norm_mean_of_top_resources() {
        let resources = vec![
            resource_with(0.9, Some(vec![1.0, 0.0])),
            resource_with(0.8, Some(vec![1.0, 0.0])),
            resource_with(0.7, Some(vec![1.0, 0.0])),
        ];
        let profile = build_profile(&resources, 50).unwrap();
        assert!((profile[0] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn profile_ignores_resources_without_embeddings() {
        let resources = vec![
            resource_with(0.9, Some(vec![1.0, 0.0])),
            resource_with(0.8, Some(vec![1.0, 0.0])),
            resource_with(0.7, None),
        ];
        assert_eq!(build_profile(&resources, 50), Err(ProfileError::InsufficientLibrary));
    }

    #[test]
    fn seed_keywords_ranks_by_usage_and_quality() {
        let mut popular = Subject::new("Machine Learning");
        popular.usage_count = 10;
        let mut rare = Subject::new("Obscure Topic");
        rare.usage_count = 1;

        let mut r1 = resource_with(0.9, Some(vec![1.0]));
        r1.subjects.insert("Machine Learning".into());
        let mut r2 = resource_with(0.9, Some(vec![1.0]));
        r2.subjects.insert("Obscure Topic".into());

        let keywords = seed_keywords(&[popular, rare], &[r1, r2], 1);
        assert_eq!(keywords, vec!["Machine Learning".to_string()]);
    }
}
