use time::OffsetDateTime;

use crate::{
    error::DataAccessError,
    roster::types::{HistoricalLookup, MemberRecord},
};

pub trait RosterLookup: Send + Sync {
    fn find(&self, station_id: &str) -> Result<Option<MemberRecord>, DataAccessError>;

    fn find_at(
        &self,
        _station_id: &str,
        _at: OffsetDateTime,
    ) -> Result<HistoricalLookup, DataAccessError> {
        Ok(HistoricalLookup::Unsupported)
    }
}
