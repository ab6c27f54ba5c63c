use std::collections::HashMap;

use time::OffsetDateTime;

use crate::{
    awards::AwardDefinition,
    history::ContactRecord,
    membership::base_station_id,
    progress::{AwardProgress, ProgressMap, ProgressSummary, counting_starts_after},
};

/// Progress of every award as of one history scan. Never mutated once published.
#[derive(Debug, Clone)]
pub struct EligibilitySnapshot {
    progress: ProgressMap,
    last_worked: HashMap<String, OffsetDateTime>,
    computed_at: OffsetDateTime,
    generation: u64,
}

impl EligibilitySnapshot {
    pub fn new(
        progress: ProgressMap,
        contacts: &[ContactRecord],
        computed_at: OffsetDateTime,
        generation: u64,
    ) -> Self {
        Self {
            progress,
            last_worked: last_worked_by_station(contacts),
            computed_at,
            generation,
        }
    }

    pub fn progress(&self, award_id: &str) -> Option<&AwardProgress> {
        self.progress.get(award_id)
    }

    pub fn progress_map(&self) -> &ProgressMap {
        &self.progress
    }

    /// Most recent contact with `station_id` (portable designators ignored).
    pub fn last_worked(&self, station_id: &str) -> Option<OffsetDateTime> {
        self.last_worked.get(&base_station_id(station_id)).copied()
    }

    pub fn computed_at(&self) -> OffsetDateTime {
        self.computed_at
    }

    /// Cache generation the underlying history scan started at.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn prerequisites_satisfied(&self, award: &AwardDefinition) -> bool {
        award.prerequisites.iter().all(|prerequisite| {
            self.progress(&prerequisite.award)
                .is_some_and(|progress| progress.satisfies(prerequisite))
        })
    }

    /// Contacts at or before this moment no longer count toward `award`.
    pub fn counting_starts_after(&self, award: &AwardDefinition) -> Option<OffsetDateTime> {
        counting_starts_after(award, &self.progress)
    }

    pub fn summaries(&self) -> Vec<ProgressSummary> {
        self.progress.values().map(AwardProgress::summary).collect()
    }
}

fn last_worked_by_station(contacts: &[ContactRecord]) -> HashMap<String, OffsetDateTime> {
    let mut last_worked: HashMap<String, OffsetDateTime> = HashMap::new();
    for contact in contacts {
        if contact.validate().is_err() {
            continue;
        }
        last_worked
            .entry(base_station_id(&contact.station_id))
            .and_modify(|latest| {
                if contact.timestamp > *latest {
                    *latest = contact.timestamp;
                }
            })
            .or_insert(contact.timestamp);
    }
    last_worked
}
