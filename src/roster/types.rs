use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, UtcOffset};

use crate::{dates::iso_date, history::KeyType, membership::MemberLevel};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub station_id: String,
    pub membership_number: String,
    pub level: MemberLevel,
    #[serde(with = "iso_date")]
    pub join_date: Date,
    /// Key the member usually operates, when the roster knows it.
    #[serde(default)]
    pub key_type: Option<KeyType>,
}

impl MemberRecord {
    /// The same member as seen at another point of its level history.
    pub fn at_level(&self, level: MemberLevel) -> Self {
        Self {
            level,
            ..self.clone()
        }
    }

    pub fn joined_by(&self, at: OffsetDateTime) -> bool {
        self.join_date <= at.to_offset(UtcOffset::UTC).date()
    }
}

/// One step of a member's level history: `level` held from `effective_from` on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelChange {
    pub level: MemberLevel,
    #[serde(with = "iso_date")]
    pub effective_from: Date,
}

/// Answer to a point-in-time roster lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoricalLookup {
    /// Member record as it stood at the requested time.
    Found(MemberRecord),
    NotMember,
    /// The roster keeps no level history; callers fall back to `find`.
    Unsupported,
}
