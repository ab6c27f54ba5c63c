use crate::{
    error::DataAccessError,
    history::types::{ContactRecord, HistoryFilter},
};

pub trait ContactHistoryStore: Send + Sync {
    fn query(&self, filter: &HistoryFilter) -> Result<Vec<ContactRecord>, DataAccessError>;
}
