use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::awards::{AwardDefinition, AwardId, Prerequisite};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ProgressStatus {
    Computed,
    /// Prerequisites not met; history was not scanned.
    BlockedByPrerequisite { missing: Vec<AwardId> },
    /// A collaborator failed while this award was computed.
    Unknown { reason: String },
}

/// Progress of one award. The count is always the size of the unique-key set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwardProgress {
    award_id: AwardId,
    target: u32,
    unique_keys: BTreeSet<String>,
    /// First qualifying contact of each counted key, ascending. Entry `n - 1` is the
    /// moment the count reached `n`.
    reached: Vec<OffsetDateTime>,
    status: ProgressStatus,
    active_endorsement: Option<String>,
    next_endorsement: Option<u32>,
    precision_warnings: u32,
}

impl AwardProgress {
    pub(crate) fn computed(
        award: &AwardDefinition,
        first_counted: BTreeMap<String, OffsetDateTime>,
        precision_warnings: u32,
    ) -> Self {
        let count = u32::try_from(first_counted.len()).unwrap_or(u32::MAX);
        let mut reached: Vec<OffsetDateTime> = first_counted.values().copied().collect();
        reached.sort_unstable();
        Self {
            award_id: award.id.clone(),
            target: award.target,
            active_endorsement: award
                .active_endorsement(count)
                .map(|endorsement| endorsement.label),
            next_endorsement: award
                .next_endorsement(count)
                .map(|endorsement| endorsement.threshold),
            unique_keys: first_counted.into_keys().collect(),
            reached,
            status: ProgressStatus::Computed,
            precision_warnings,
        }
    }

    pub(crate) fn blocked(award: &AwardDefinition, missing: Vec<AwardId>) -> Self {
        Self::empty(award, ProgressStatus::BlockedByPrerequisite { missing })
    }

    pub(crate) fn unknown(award: &AwardDefinition, reason: impl Into<String>) -> Self {
        Self::empty(
            award,
            ProgressStatus::Unknown {
                reason: reason.into(),
            },
        )
    }

    fn empty(award: &AwardDefinition, status: ProgressStatus) -> Self {
        Self {
            award_id: award.id.clone(),
            target: award.target,
            unique_keys: BTreeSet::new(),
            reached: Vec::new(),
            status,
            active_endorsement: None,
            next_endorsement: None,
            precision_warnings: 0,
        }
    }

    pub fn award_id(&self) -> &str {
        &self.award_id
    }

    pub fn target(&self) -> u32 {
        self.target
    }

    pub fn current_count(&self) -> u32 {
        u32::try_from(self.unique_keys.len()).unwrap_or(u32::MAX)
    }

    pub fn qualified(&self) -> bool {
        self.is_computed() && self.current_count() >= self.target
    }

    pub fn distance(&self) -> u32 {
        self.target.saturating_sub(self.current_count())
    }

    pub fn unique_keys(&self) -> &BTreeSet<String> {
        &self.unique_keys
    }

    pub fn has_counted(&self, key: &str) -> bool {
        self.unique_keys.contains(key)
    }

    pub fn status(&self) -> &ProgressStatus {
        &self.status
    }

    pub fn is_computed(&self) -> bool {
        matches!(self.status, ProgressStatus::Computed)
    }

    pub fn active_endorsement(&self) -> Option<&str> {
        self.active_endorsement.as_deref()
    }

    pub fn next_endorsement(&self) -> Option<u32> {
        self.next_endorsement
    }

    /// Contacts counted with the member's current level because the roster keeps
    /// no level history.
    pub fn precision_warnings(&self) -> u32 {
        self.precision_warnings
    }

    /// Whether this progress meets `prerequisite` (its own target unless a minimum
    /// count is given).
    pub fn satisfies(&self, prerequisite: &Prerequisite) -> bool {
        let needed = prerequisite.min_count.unwrap_or(self.target);
        self.is_computed() && self.current_count() >= needed
    }

    /// When the count first reached `count`, judged by each key's earliest
    /// qualifying contact. `None` if it has not.
    pub fn reached_at(&self, count: u32) -> Option<OffsetDateTime> {
        let index = usize::try_from(count.checked_sub(1)?).ok()?;
        self.reached.get(index).copied()
    }

    /// When `prerequisite` was met by this progress.
    pub fn satisfied_at(&self, prerequisite: &Prerequisite) -> Option<OffsetDateTime> {
        if !self.satisfies(prerequisite) {
            return None;
        }
        self.reached_at(prerequisite.min_count.unwrap_or(self.target).max(1))
    }

    pub fn summary(&self) -> ProgressSummary {
        ProgressSummary {
            award_id: self.award_id.clone(),
            current_count: self.current_count(),
            target: self.target,
            qualified: self.qualified(),
            distance: self.distance(),
            active_endorsement: self.active_endorsement.clone(),
            next_endorsement: self.next_endorsement,
            precision_warnings: self.precision_warnings,
            qualified_at: if self.qualified() {
                self.reached_at(self.target)
            } else {
                None
            },
            status: self.status.clone(),
        }
    }
}

/// Flat, serializable view of one award's progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub award_id: AwardId,
    pub current_count: u32,
    pub target: u32,
    pub qualified: bool,
    pub distance: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_endorsement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_endorsement: Option<u32>,
    #[serde(default)]
    pub precision_warnings: u32,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub qualified_at: Option<OffsetDateTime>,
    pub status: ProgressStatus,
}
