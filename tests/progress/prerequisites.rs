use awardwatch::{
    awards::{AwardRegistry, CENTURION, SENATOR, TRIBUNE},
    history::KeyType,
    membership::MemberLevel,
    progress::{ProgressStatus, compute_all},
    roster::InMemoryRoster,
};
use time::Duration;

use crate::support::{LONG_AGO, NOW, cw_contact, worked_members};

#[test]
fn given_centurion_one_short_when_compute_all_then_tribune_is_blocked_regardless_of_own_count() {
    let (entries, history) = worked_members("T", 99, MemberLevel::Tribune);
    let roster = InMemoryRoster::from_entries(entries);
    let registry = AwardRegistry::builtin().expect("builtin table should load");

    let progress = compute_all(&history, &roster, &registry);

    let centurion = progress.get(CENTURION).expect("centurion should be computed");
    assert_eq!(centurion.current_count(), 99);
    assert_eq!(centurion.distance(), 1);
    assert!(!centurion.qualified());

    let tribune = progress.get(TRIBUNE).expect("tribune should be present");
    assert!(!tribune.qualified());
    assert_eq!(tribune.current_count(), 0);
    assert_eq!(
        tribune.status(),
        &ProgressStatus::BlockedByPrerequisite {
            missing: vec![CENTURION.to_string()]
        }
    );
}

#[test]
fn given_tribune_qualified_below_x8_when_compute_all_then_senator_is_blocked() {
    let (entries, history) = worked_members("T", 150, MemberLevel::Tribune);
    let roster = InMemoryRoster::from_entries(entries);
    let registry = AwardRegistry::builtin().expect("builtin table should load");

    let progress = compute_all(&history, &roster, &registry);

    let tribune = progress.get(TRIBUNE).expect("tribune should be computed");
    assert!(tribune.qualified());
    assert_eq!(tribune.current_count(), 150);
    assert_eq!(tribune.active_endorsement(), Some("Tribune x3"));

    let senator = progress.get(SENATOR).expect("senator should be present");
    assert!(!senator.qualified());
    assert_eq!(
        senator.status(),
        &ProgressStatus::BlockedByPrerequisite {
            missing: vec![TRIBUNE.to_string()]
        }
    );
}

#[test]
fn given_every_award_when_compute_all_then_progress_exists_for_each_registry_entry() {
    let registry = AwardRegistry::builtin().expect("builtin table should load");
    let progress = compute_all(&[], &InMemoryRoster::new(), &registry);

    assert_eq!(progress.len(), registry.len());
    let centurion = progress.get(CENTURION).expect("centurion should be computed");
    assert_eq!(centurion.distance(), 100);
    assert_eq!(centurion.next_endorsement(), Some(100));
    assert!(centurion.active_endorsement().is_none());
}

#[test]
fn given_tribune_x8_reached_when_compute_all_then_senator_counts_only_later_contacts() {
    let (entries, mut history) = worked_members("K", 400, MemberLevel::Tribune);
    let roster = InMemoryRoster::from_entries(entries);
    let registry = AwardRegistry::builtin().expect("builtin table should load");

    let progress = compute_all(&history, &roster, &registry);
    let tribune = progress.get(TRIBUNE).expect("tribune should be computed");
    assert_eq!(tribune.active_endorsement(), Some("Tribune x8"));
    assert_eq!(tribune.reached_at(400), Some(LONG_AGO));
    let senator = progress.get(SENATOR).expect("senator should be computed");
    assert!(senator.is_computed());
    assert_eq!(senator.current_count(), 0, "contacts that earned x8 do not count");
    assert!(!senator.qualified());

    // Same instant as the x8 contact: still not after it.
    history.push(cw_contact("K0000X", "10000", LONG_AGO));
    history.push(cw_contact("K0001X", "10001", NOW - Duration::days(3)));
    history.push(cw_contact("K0002X/P", "10002T", NOW - Duration::days(2)));
    let mut keyer = cw_contact("K0003X", "10003", NOW - Duration::days(1));
    keyer.key_type = Some(KeyType::from("keyer"));
    history.push(keyer);

    let progress = compute_all(&history, &roster, &registry);
    let senator = progress.get(SENATOR).expect("senator should be computed");
    assert_eq!(senator.current_count(), 2);
    assert!(senator.has_counted("10001"));
    assert!(senator.has_counted("10002"));
    assert_eq!(senator.distance(), 198);
}
