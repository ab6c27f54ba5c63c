pub mod classifier;
pub mod types;

pub use classifier::{COLD_CACHE_EXPLANATION, ROSTER_UNAVAILABLE_EXPLANATION, SpotClassifier};
pub use types::{ClassifierConfig, Contribution, EligibilityResult, EligibilityTier, Spot};
