pub mod builtin;
pub mod endorsement;
pub mod predicate;
pub mod registry;
pub mod types;

pub use builtin::{
    CENTURION, SENATOR, SPECIAL_EVENT_CALLS, TRIBUNE, TRIPLE_KEY_BUG, TRIPLE_KEY_SIDESWIPER,
    TRIPLE_KEY_STRAIGHT, builtin_rows,
};
pub use endorsement::{active_endorsement, next_endorsement, stepped_endorsement};
pub use predicate::ContactPredicate;
pub use registry::AwardRegistry;
pub use types::{
    AwardDefinition, AwardId, AwardRow, EligibilityRule, Endorsement, Prerequisite, UniqueKeyRule,
};
