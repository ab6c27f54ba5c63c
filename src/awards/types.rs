use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    awards::{
        endorsement::{self, stepped_endorsement},
        predicate::{self, ContactPredicate},
    },
    dates::iso_date,
    history::{ContactRecord, KeyType, Mode},
    membership::{MemberLevel, base_number, base_station_id},
    roster::MemberRecord,
};

pub type AwardId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prerequisite {
    pub award: AwardId,
    /// Count the prerequisite award must have reached. Defaults to its target.
    #[serde(default)]
    pub min_count: Option<u32>,
    /// Only contacts made after the prerequisite reached that count are counted.
    #[serde(default)]
    pub count_after_reached: bool,
}

impl Prerequisite {
    pub fn qualified(award: impl Into<AwardId>) -> Self {
        Self {
            award: award.into(),
            min_count: None,
            count_after_reached: false,
        }
    }

    pub fn at_least(award: impl Into<AwardId>, min_count: u32) -> Self {
        Self {
            award: award.into(),
            min_count: Some(min_count),
            count_after_reached: false,
        }
    }

    /// `at_least`, and the dependent award starts counting only once it is reached.
    pub fn after_reaching(award: impl Into<AwardId>, min_count: u32) -> Self {
        Self {
            count_after_reached: true,
            ..Self::at_least(award, min_count)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endorsement {
    pub threshold: u32,
    pub label: String,
}

impl Endorsement {
    pub fn new(threshold: u32, label: impl Into<String>) -> Self {
        Self {
            threshold,
            label: label.into(),
        }
    }
}

/// How a qualifying contact is reduced to the identity that is counted once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UniqueKeyRule {
    /// Membership number with level letter and multiplier stripped.
    #[default]
    MembershipBase,
    /// Station id with portable designators stripped.
    StationId,
}

impl UniqueKeyRule {
    pub fn key_for_contact(&self, contact: &ContactRecord, member: &MemberRecord) -> Option<String> {
        match self {
            Self::MembershipBase => contact
                .membership_number
                .as_deref()
                .and_then(base_number)
                .or_else(|| base_number(&member.membership_number)),
            Self::StationId => non_empty(base_station_id(&contact.station_id)),
        }
    }

    pub fn key_for_member(&self, member: &MemberRecord) -> Option<String> {
        match self {
            Self::MembershipBase => base_number(&member.membership_number),
            Self::StationId => non_empty(base_station_id(&member.station_id)),
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

fn all_levels() -> BTreeSet<MemberLevel> {
    MemberLevel::ALL.into_iter().collect()
}

/// Declarative eligibility rule of one award row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityRule {
    /// Empty means any mode.
    #[serde(default)]
    pub modes: Vec<Mode>,
    #[serde(default, with = "iso_date::option")]
    pub min_date: Option<Date>,
    #[serde(default = "all_levels")]
    pub accepted_levels: BTreeSet<MemberLevel>,
    #[serde(default)]
    pub require_membership_at_contact: bool,
    #[serde(default)]
    pub excluded_stations: BTreeSet<String>,
    /// Keys a contact may be made with. Empty means any key.
    #[serde(default)]
    pub key_types: BTreeSet<KeyType>,
    /// Contacts without a reported key are rejected instead of given the benefit of
    /// the doubt.
    #[serde(default)]
    pub key_type_required: bool,
}

impl Default for EligibilityRule {
    fn default() -> Self {
        Self {
            modes: Vec::new(),
            min_date: None,
            accepted_levels: all_levels(),
            require_membership_at_contact: false,
            excluded_stations: BTreeSet::new(),
            key_types: BTreeSet::new(),
            key_type_required: false,
        }
    }
}

impl EligibilityRule {
    pub fn compile(&self) -> ContactPredicate {
        let mut parts = Vec::new();
        if !self.modes.is_empty() {
            parts.push(predicate::mode_is(self.modes.iter().cloned()));
        }
        if let Some(min_date) = self.min_date {
            parts.push(predicate::date_at_least(min_date));
        }
        parts.push(predicate::level_in(self.accepted_levels.iter().copied()));
        if self.require_membership_at_contact {
            parts.push(predicate::member_at_contact());
        }
        if !self.excluded_stations.is_empty() {
            parts.push(predicate::station_not_in(
                self.excluded_stations.iter().cloned(),
            ));
        }
        if !self.key_types.is_empty() || self.key_type_required {
            parts.push(predicate::key_type_in(
                self.key_types.iter().cloned(),
                self.key_type_required,
            ));
        }
        predicate::all_of(parts)
    }

    pub fn admits_level(&self, level: MemberLevel) -> bool {
        self.accepted_levels.contains(&level)
    }

    pub fn admits_mode(&self, mode: &Mode) -> bool {
        self.modes.is_empty() || self.modes.contains(mode)
    }

    pub fn admits_station(&self, station_id: &str) -> bool {
        let base = base_station_id(station_id);
        !self
            .excluded_stations
            .iter()
            .any(|excluded| base_station_id(excluded) == base)
    }
}

/// One row of the award table, as written in code or in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardRow {
    pub id: AwardId,
    pub name: String,
    #[serde(default)]
    pub prerequisites: Vec<Prerequisite>,
    pub target: u32,
    #[serde(default)]
    pub rule: EligibilityRule,
    #[serde(default)]
    pub unique_key: UniqueKeyRule,
    #[serde(default)]
    pub endorsements: Vec<Endorsement>,
    /// Past the last listed endorsement, one more is earned every `endorsement_step`
    /// unique contacts.
    #[serde(default)]
    pub endorsement_step: Option<u32>,
}

/// A validated award row with its compiled predicate. Immutable after load.
pub struct AwardDefinition {
    pub id: AwardId,
    pub name: String,
    pub prerequisites: Vec<Prerequisite>,
    pub target: u32,
    pub rule: EligibilityRule,
    pub unique_key: UniqueKeyRule,
    pub endorsements: Vec<Endorsement>,
    pub endorsement_step: Option<u32>,
    predicate: ContactPredicate,
}

impl AwardDefinition {
    pub(crate) fn from_row(row: AwardRow) -> Self {
        let predicate = row.rule.compile();
        Self {
            id: row.id,
            name: row.name,
            prerequisites: row.prerequisites,
            target: row.target,
            rule: row.rule,
            unique_key: row.unique_key,
            endorsements: row.endorsements,
            endorsement_step: row.endorsement_step,
            predicate,
        }
    }

    /// Whether `contact`, made with `member` as they stood at contact time, qualifies.
    pub fn admits(&self, contact: &ContactRecord, member: &MemberRecord) -> bool {
        (self.predicate)(contact, member)
    }

    pub fn is_root(&self) -> bool {
        self.prerequisites.is_empty()
    }

    /// Highest endorsement earned at `count`, continuing past the listed ladder in
    /// `endorsement_step` increments.
    pub fn active_endorsement(&self, count: u32) -> Option<Endorsement> {
        if let (Some(step), Some(last)) = (self.endorsement_step, self.endorsements.last()) {
            let stepped = count / step * step;
            if stepped > last.threshold {
                return Some(stepped_endorsement(&self.name, self.target, stepped));
            }
        }
        endorsement::active_endorsement(&self.endorsements, count).cloned()
    }

    /// Next endorsement above `count`. `None` once the ladder is exhausted and the
    /// award has no step.
    pub fn next_endorsement(&self, count: u32) -> Option<Endorsement> {
        if let Some(listed) = endorsement::next_endorsement(&self.endorsements, count) {
            return Some(listed.clone());
        }
        let step = self.endorsement_step?;
        let threshold = (count / step).checked_add(1)?.checked_mul(step)?;
        Some(stepped_endorsement(&self.name, self.target, threshold))
    }
}

impl fmt::Debug for AwardDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwardDefinition")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("prerequisites", &self.prerequisites)
            .field("target", &self.target)
            .field("rule", &self.rule)
            .field("unique_key", &self.unique_key)
            .field("endorsements", &self.endorsements.len())
            .field("endorsement_step", &self.endorsement_step)
            .finish_non_exhaustive()
    }
}
