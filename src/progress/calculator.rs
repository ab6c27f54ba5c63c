use std::{
    cell::RefCell,
    collections::{BTreeMap, HashMap},
};

use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;

use crate::{
    awards::{AwardDefinition, AwardId, AwardRegistry},
    error::{DataAccessError, RefreshError},
    history::ContactRecord,
    membership::normalize_station_id,
    progress::types::AwardProgress,
    roster::{HistoricalLookup, MemberRecord, RosterLookup},
};

pub type ProgressMap = BTreeMap<AwardId, AwardProgress>;

/// How the member behind one contact was resolved.
#[derive(Debug, Clone)]
enum ContactMember {
    AtContact(MemberRecord),
    /// Current record used because the roster keeps no level history.
    Current(MemberRecord),
    NotMember,
}

/// Roster view that answers each distinct question once per computation pass.
pub struct MemoizedRoster<'a> {
    roster: &'a dyn RosterLookup,
    at_contact: RefCell<HashMap<(String, OffsetDateTime), Result<ContactMember, DataAccessError>>>,
    current: RefCell<HashMap<String, Result<Option<MemberRecord>, DataAccessError>>>,
}

impl<'a> MemoizedRoster<'a> {
    pub fn new(roster: &'a dyn RosterLookup) -> Self {
        Self {
            roster,
            at_contact: RefCell::new(HashMap::new()),
            current: RefCell::new(HashMap::new()),
        }
    }

    pub fn find(&self, station_id: &str) -> Result<Option<MemberRecord>, DataAccessError> {
        let station = normalize_station_id(station_id);
        if let Some(cached) = self.current.borrow().get(&station) {
            return cached.clone();
        }
        let answer = self.roster.find(&station);
        self.current.borrow_mut().insert(station, answer.clone());
        answer
    }

    fn member_at(&self, contact: &ContactRecord) -> Result<ContactMember, DataAccessError> {
        let key = (contact.normalized_station_id(), contact.timestamp);
        if let Some(cached) = self.at_contact.borrow().get(&key) {
            return cached.clone();
        }

        let answer = match self.roster.find_at(&key.0, contact.timestamp) {
            Ok(HistoricalLookup::Found(member)) => Ok(ContactMember::AtContact(member)),
            Ok(HistoricalLookup::NotMember) => Ok(ContactMember::NotMember),
            Ok(HistoricalLookup::Unsupported) => match self.find(&key.0) {
                Ok(Some(member)) => Ok(ContactMember::Current(member)),
                Ok(None) => Ok(ContactMember::NotMember),
                Err(err) => Err(err),
            },
            Err(err) => Err(err),
        };
        self.at_contact.borrow_mut().insert(key, answer.clone());
        answer
    }
}

/// Progress of one award. `resolved` must already hold every prerequisite's progress.
pub fn compute(
    award: &AwardDefinition,
    history: &[ContactRecord],
    roster: &dyn RosterLookup,
    resolved: &ProgressMap,
) -> AwardProgress {
    compute_with(award, history, &MemoizedRoster::new(roster), resolved)
}

/// Progress of every award, in prerequisite order.
pub fn compute_all(
    history: &[ContactRecord],
    roster: &dyn RosterLookup,
    registry: &AwardRegistry,
) -> ProgressMap {
    compute_all_until(history, roster, registry, &CancellationToken::new()).unwrap_or_default()
}

/// `compute_all` that stops between awards once `cancel` fires.
pub fn compute_all_until(
    history: &[ContactRecord],
    roster: &dyn RosterLookup,
    registry: &AwardRegistry,
    cancel: &CancellationToken,
) -> Result<ProgressMap, RefreshError> {
    let valid: Vec<ContactRecord> = history
        .iter()
        .filter(|contact| match contact.validate() {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(target: "progress", error = %err, "malformed_contact_skipped");
                false
            }
        })
        .cloned()
        .collect();

    let roster = MemoizedRoster::new(roster);
    let mut resolved = ProgressMap::new();
    for award in registry.iter() {
        if cancel.is_cancelled() {
            return Err(RefreshError::Cancelled);
        }
        let progress = compute_with(award, &valid, &roster, &resolved);
        resolved.insert(award.id.clone(), progress);
    }

    tracing::debug!(
        target: "progress",
        awards = resolved.len(),
        contacts = valid.len(),
        "progress_pass_completed"
    );
    Ok(resolved)
}

pub fn compute_with(
    award: &AwardDefinition,
    history: &[ContactRecord],
    roster: &MemoizedRoster<'_>,
    resolved: &ProgressMap,
) -> AwardProgress {
    let missing: Vec<AwardId> = award
        .prerequisites
        .iter()
        .filter(|prerequisite| {
            !resolved
                .get(&prerequisite.award)
                .is_some_and(|progress| progress.satisfies(prerequisite))
        })
        .map(|prerequisite| prerequisite.award.clone())
        .collect();
    if !missing.is_empty() {
        tracing::debug!(
            target: "progress",
            award_id = %award.id,
            missing = ?missing,
            "award_blocked_by_prerequisite"
        );
        return AwardProgress::blocked(award, missing);
    }

    let counts_after = counting_starts_after(award, resolved);
    let mut first_counted: BTreeMap<String, OffsetDateTime> = BTreeMap::new();
    let mut precision_warnings: u32 = 0;
    for contact in history {
        if contact.validate().is_err() || !award.rule.admits_mode(&contact.mode) {
            continue;
        }
        if counts_after.is_some_and(|after| contact.timestamp <= after) {
            continue;
        }

        let member = match roster.member_at(contact) {
            Ok(ContactMember::AtContact(member)) => member,
            Ok(ContactMember::Current(member)) => {
                precision_warnings = precision_warnings.saturating_add(1);
                member
            }
            Ok(ContactMember::NotMember) => continue,
            Err(err) => {
                tracing::warn!(
                    target: "progress",
                    award_id = %award.id,
                    error = %err,
                    "award_progress_unknown"
                );
                return AwardProgress::unknown(award, err.to_string());
            }
        };

        if !award.admits(contact, &member) {
            continue;
        }
        if let Some(key) = award.unique_key.key_for_contact(contact, &member) {
            first_counted
                .entry(key)
                .and_modify(|first| {
                    if contact.timestamp < *first {
                        *first = contact.timestamp;
                    }
                })
                .or_insert(contact.timestamp);
        }
    }

    if precision_warnings > 0 {
        tracing::warn!(
            target: "progress",
            award_id = %award.id,
            contacts = precision_warnings,
            "level_history_unavailable_using_current_level"
        );
    }

    AwardProgress::computed(award, first_counted, precision_warnings)
}

/// Latest moment a `count_after_reached` prerequisite of `award` was met. Only
/// contacts strictly after it count toward `award`.
pub fn counting_starts_after(
    award: &AwardDefinition,
    resolved: &ProgressMap,
) -> Option<OffsetDateTime> {
    award
        .prerequisites
        .iter()
        .filter(|prerequisite| prerequisite.count_after_reached)
        .filter_map(|prerequisite| {
            resolved
                .get(&prerequisite.award)
                .and_then(|progress| progress.satisfied_at(prerequisite))
        })
        .max()
}
