//! Quality Scorer (C6, spec §4.6): five weighted dimensions per resource,
//! plus periodic outlier and degradation passes over the whole corpus.

mod degradation;
mod outlier;
mod scorer;

pub use degradation::is_degraded;
pub use outlier::{detect_outliers, OutlierFlag};
pub use scorer::{domain_reputation, score, QualityInputs};
