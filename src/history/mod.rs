pub mod memory;
pub mod ports;
pub mod types;

pub use memory::InMemoryContactHistory;
pub use ports::ContactHistoryStore;
pub use types::{ContactRecord, HistoryFilter, KeyType, Mode};
