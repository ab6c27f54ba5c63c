//! Pure contact predicates and the combinators award rules are built from.
//!
//! Every predicate sees the contact together with the member record as it stood at
//! contact time (or the current record when the roster keeps no level history).

use std::{collections::BTreeSet, sync::Arc};

use time::{Date, UtcOffset};

use crate::{
    history::{ContactRecord, KeyType, Mode},
    membership::{MemberLevel, base_station_id},
    roster::MemberRecord,
};

pub type ContactPredicate = Arc<dyn Fn(&ContactRecord, &MemberRecord) -> bool + Send + Sync>;

pub fn any() -> ContactPredicate {
    Arc::new(|_, _| true)
}

pub fn mode_is(modes: impl IntoIterator<Item = Mode>) -> ContactPredicate {
    let modes: BTreeSet<Mode> = modes.into_iter().collect();
    Arc::new(move |contact, _| modes.contains(&contact.mode))
}

/// Contact made on or after `min` (UTC calendar date).
pub fn date_at_least(min: Date) -> ContactPredicate {
    Arc::new(move |contact, _| contact.timestamp.to_offset(UtcOffset::UTC).date() >= min)
}

pub fn level_in(levels: impl IntoIterator<Item = MemberLevel>) -> ContactPredicate {
    let levels: BTreeSet<MemberLevel> = levels.into_iter().collect();
    Arc::new(move |_, member| levels.contains(&member.level))
}

/// The other station had already joined when the contact was made.
pub fn member_at_contact() -> ContactPredicate {
    Arc::new(|contact, member| member.joined_by(contact.timestamp))
}

pub fn station_not_in(stations: impl IntoIterator<Item = String>) -> ContactPredicate {
    let stations: BTreeSet<String> = stations
        .into_iter()
        .map(|station| base_station_id(&station))
        .collect();
    Arc::new(move |contact, _| !stations.contains(&base_station_id(&contact.station_id)))
}

/// Contact made with one of `keys` (any reported key when empty). A contact with no
/// reported key passes unless `required`.
pub fn key_type_in(keys: impl IntoIterator<Item = KeyType>, required: bool) -> ContactPredicate {
    let keys: BTreeSet<KeyType> = keys.into_iter().collect();
    Arc::new(move |contact, _| match &contact.key_type {
        Some(key) => keys.is_empty() || keys.contains(key),
        None => !required,
    })
}

pub fn all_of(predicates: Vec<ContactPredicate>) -> ContactPredicate {
    if predicates.is_empty() {
        return any();
    }
    Arc::new(move |contact, member| {
        predicates
            .iter()
            .all(|predicate| predicate(contact, member))
    })
}
