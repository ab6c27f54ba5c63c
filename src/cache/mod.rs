pub mod cache;
pub mod snapshot;

pub use cache::{CacheConfig, EligibilityCache};
pub use snapshot::EligibilitySnapshot;
