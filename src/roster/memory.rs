use std::{collections::BTreeMap, fs, path::Path, sync::RwLock};

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

use crate::{
    error::DataAccessError,
    membership::{MemberLevel, base_station_id, normalize_station_id},
    roster::{
        ports::RosterLookup,
        types::{HistoricalLookup, LevelChange, MemberRecord},
    },
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    #[serde(flatten)]
    pub record: MemberRecord,
    /// Ascending by `effective_from`. Empty when the roster source keeps no history.
    #[serde(default)]
    pub level_history: Vec<LevelChange>,
}

impl RosterEntry {
    pub fn current(record: MemberRecord) -> Self {
        Self {
            record,
            level_history: Vec::new(),
        }
    }

    fn level_at(&self, at: OffsetDateTime) -> HistoricalLookup {
        if self.level_history.is_empty() {
            return HistoricalLookup::Unsupported;
        }
        if !self.record.joined_by(at) {
            return HistoricalLookup::NotMember;
        }

        let date = at.to_offset(UtcOffset::UTC).date();
        let held = self
            .level_history
            .partition_point(|change| change.effective_from <= date);
        match held.checked_sub(1) {
            Some(index) => {
                HistoricalLookup::Found(self.record.at_level(self.level_history[index].level))
            }
            None => HistoricalLookup::Found(self.record.at_level(MemberLevel::Member)),
        }
    }
}

/// Roster held in memory, keyed by normalized station id.
#[derive(Debug, Default)]
pub struct InMemoryRoster {
    entries: RwLock<BTreeMap<String, RosterEntry>>,
}

impl InMemoryRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = RosterEntry>) -> Self {
        let roster = Self::new();
        for entry in entries {
            roster.upsert(entry);
        }
        roster
    }

    pub fn load_json(path: &Path) -> Result<Self, DataAccessError> {
        let content = fs::read_to_string(path).map_err(|err| {
            DataAccessError::roster(format!("failed to read '{}': {err}", path.display()))
        })?;
        let entries: Vec<RosterEntry> = serde_json::from_str(&content).map_err(|err| {
            DataAccessError::roster(format!("failed to parse '{}': {err}", path.display()))
        })?;
        Ok(Self::from_entries(entries))
    }

    pub fn upsert(&self, mut entry: RosterEntry) {
        entry
            .level_history
            .sort_by(|lhs, rhs| lhs.effective_from.cmp(&rhs.effective_from));
        let key = normalize_station_id(&entry.record.station_id);
        self.entries
            .write()
            .expect("lock poisoned")
            .insert(key, entry);
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry(&self, station_id: &str) -> Option<RosterEntry> {
        let guard = self.entries.read().expect("lock poisoned");
        guard
            .get(&normalize_station_id(station_id))
            .or_else(|| guard.get(&base_station_id(station_id)))
            .cloned()
    }
}

impl RosterLookup for InMemoryRoster {
    fn find(&self, station_id: &str) -> Result<Option<MemberRecord>, DataAccessError> {
        Ok(self.entry(station_id).map(|entry| entry.record))
    }

    fn find_at(
        &self,
        station_id: &str,
        at: OffsetDateTime,
    ) -> Result<HistoricalLookup, DataAccessError> {
        Ok(match self.entry(station_id) {
            Some(entry) => entry.level_at(at),
            None => HistoricalLookup::NotMember,
        })
    }
}
