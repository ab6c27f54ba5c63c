pub mod calculator;
pub mod types;

pub use calculator::{
    MemoizedRoster, ProgressMap, compute, compute_all, compute_all_until, counting_starts_after,
};
pub use types::{AwardProgress, ProgressStatus, ProgressSummary};
