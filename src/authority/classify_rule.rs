//! Rule-based UDC-flat-code classifier (spec §4.5).
//!
//! Each code has an ordered list of `(keyword, weight)` patterns; a code's
//! score is the sum of weights of keywords that appear in the classification
//! text. The default threshold is 1.0 — a single strong keyword match is
//! enough, several weak ones must add up.

pub const DEFAULT_RULE_THRESHOLD: f32 = 1.0;

#[derive(Debug, Clone)]
pub struct ClassificationRule {
    pub code: String,
    pub name: String,
    pub keywords: Vec<(String, f32)>,
}

impl ClassificationRule {
    pub fn new(code: impl Into<String>, name: impl Into<String>, keywords: &[(&str, f32)]) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            keywords: keywords.iter().map(|(k, w)| (k.to_string(), *w)).collect(),
        }
    }

    fn score(&self, lower_text: &str) -> f32 {
        self.keywords
            .iter()
            .filter(|(keyword, _)| lower_text.contains(keyword.as_str()))
            .map(|(_, weight)| weight)
            .sum()
    }
}

/// A small UDC-inspired default rule set (spec §4.5 examples: "004"
/// computing, "005" software). Not exhaustive — callers may supply their
/// own rule set via [`classify`].
pub fn default_rules() -> Vec<ClassificationRule> {
    vec![
        ClassificationRule::new(
            "004",
            "Computer science",
            &[("computer", 0.6), ("computing", 0.6), ("algorithm", 0.5), ("data structure", 0.5)],
        ),
        ClassificationRule::new(
            "005",
            "Software",
            &[("software", 0.7), ("programming", 0.5), ("source code", 0.5), ("compiler", 0.4)],
        ),
        ClassificationRule::new(
            "006",
            "Artificial intelligence",
            &[
                ("machine learning", 0.8),
                ("neural network", 0.8),
                ("artificial intelligence", 0.9),
                ("deep learning", 0.8),
            ],
        ),
        ClassificationRule::new(
            "510",
            "Mathematics",
            &[("theorem", 0.6), ("proof", 0.4), ("equation", 0.4), ("mathematics", 0.7)],
        ),
        ClassificationRule::new(
            "150",
            "Psychology",
            &[("cognitive", 0.5), ("behavior", 0.4), ("psychology", 0.8)],
        ),
    ]
}

/// Classify `text` against `rules`; returns the top-scoring code if its
/// score exceeds `threshold`, else `None`.
pub fn classify(text: &str, rules: &[ClassificationRule], threshold: f32) -> Option<(String, f32)> {
    let lower_text = text.to_lowercase();
    rules
        .iter()
        .map(|rule| (rule.code.clone(), rule.score(&lower_text)))
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .filter(|(_, score)| *score > threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_clear_ai_text_as_006() {
        let rules = default_rules();
        let result = classify(
            "A survey of deep learning and neural network architectures for machine learning.",
            &rules,
            DEFAULT_RULE_THRESHOLD,
        );
        assert_eq!(result.unwrap().0, "006");
    }

    #[test]
    fn below_threshold_returns_none() {
        let rules = default_rules();
        let result = classify("A recipe for banana bread.", &rules, DEFAULT_RULE_THRESHOLD);
        assert!(result.is_none());
    }

    #[test]
    fn picks_highest_scoring_code_on_overlap() {
        let rules = default_rules();
        let result = classify(
            "This software discusses programming but mostly artificial intelligence and machine learning.",
            &rules,
            DEFAULT_RULE_THRESHOLD,
        );
        assert_eq!(result.unwrap().0, "006");
    }
}
