pub mod memory;
pub mod ports;
pub mod types;

pub use memory::{InMemoryRoster, RosterEntry};
pub use ports::RosterLookup;
pub use types::{HistoricalLookup, LevelChange, MemberRecord};
