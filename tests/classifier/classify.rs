use std::sync::Arc;

use awardwatch::{
    awards::{
        AwardRegistry, AwardRow, CENTURION, EligibilityRule, Prerequisite, TRIBUNE,
        TRIPLE_KEY_BUG, UniqueKeyRule,
    },
    cache::{CacheConfig, EligibilityCache},
    classifier::{
        COLD_CACHE_EXPLANATION, ClassifierConfig, EligibilityTier, ROSTER_UNAVAILABLE_EXPLANATION,
        SpotClassifier,
    },
    clock::ManualClock,
    error::ValidationError,
    history::{ContactRecord, InMemoryContactHistory, KeyType, Mode},
    membership::MemberLevel,
    roster::{InMemoryRoster, RosterEntry, RosterLookup},
};
use time::{Duration, macros::date};

use crate::support::{
    FailingRoster, NOW, cache_with, cw_contact, member, seeded_cache, spot, worked_members,
};

fn newcomer(station: &str, number: &str, level: MemberLevel) -> RosterEntry {
    RosterEntry::current(member(station, number, level, date!(2021 - 01 - 01)))
}

/// `worked` Centurion-counting members plus `extra` roster entries, snapshot warmed.
fn warm_cache(
    worked: usize,
    level: MemberLevel,
    extra: Vec<RosterEntry>,
    more_history: Vec<ContactRecord>,
) -> Arc<EligibilityCache> {
    let (mut entries, mut history) = worked_members("W", worked, level);
    entries.extend(extra);
    history.extend(more_history);
    let (cache, _, _) = seeded_cache(entries, history);
    cache.get_snapshot().expect("snapshot should build");
    cache
}

#[test]
fn given_centurion_at_98_when_unworked_member_spotted_then_critical_need_two() {
    let cache = warm_cache(
        98,
        MemberLevel::Member,
        vec![newcomer("N0NEW", "30000", MemberLevel::Member)],
        Vec::new(),
    );

    let result = SpotClassifier::default()
        .classify(&spot("N0NEW", Mode::Cw, NOW), &cache)
        .expect("spot is valid");

    assert_eq!(result.tier, EligibilityTier::Critical);
    assert_eq!(result.explanation, "Need 2 more for Centurion.");
    assert_eq!(result.contributions.len(), 1);
    assert_eq!(result.contributions[0].award_id, CENTURION);
    assert_eq!(result.contributions[0].distance, 2);
    assert_eq!(result.generation, Some(0));
    assert_eq!(result.computed_at, Some(NOW));
}

#[test]
fn given_station_worked_ten_days_ago_when_spotted_then_low_regardless_of_distance() {
    let cache = warm_cache(
        98,
        MemberLevel::Member,
        vec![newcomer("N0NEW", "30000", MemberLevel::Member)],
        vec![{
            let mut phone = cw_contact("N0NEW", "30000", NOW - Duration::days(10));
            phone.mode = Mode::Ssb;
            phone
        }],
    );

    let result = SpotClassifier::default()
        .classify(&spot("N0NEW/P", Mode::Cw, NOW), &cache)
        .expect("spot is valid");

    assert_eq!(result.tier, EligibilityTier::Low);
    assert_eq!(result.explanation, "Worked 10 days ago (recent window 30 days).");
    assert!(result.contributions.is_empty());
}

#[test]
fn given_station_outside_roster_when_spotted_then_none_without_explanation() {
    let cache = warm_cache(98, MemberLevel::Member, Vec::new(), Vec::new());

    let result = SpotClassifier::default()
        .classify(&spot("DL1XYZ", Mode::Cw, NOW), &cache)
        .expect("spot is valid");

    assert_eq!(result.tier, EligibilityTier::None);
    assert!(result.explanation.is_empty());
    assert!(result.contributions.is_empty());
}

#[test]
fn given_centurion_unqualified_when_tribune_level_member_spotted_then_only_centurion_contributes() {
    let cache = warm_cache(
        50,
        MemberLevel::Tribune,
        vec![newcomer("K5TRB", "41000T", MemberLevel::Tribune)],
        Vec::new(),
    );

    let result = SpotClassifier::default()
        .classify(&spot("K5TRB", Mode::Cw, NOW), &cache)
        .expect("spot is valid");

    assert_eq!(result.tier, EligibilityTier::Medium);
    assert_eq!(result.explanation, "Need 50 more for Centurion.");
    assert!(
        result
            .contributions
            .iter()
            .all(|contribution| contribution.award_id != TRIBUNE)
    );
}

#[test]
fn given_centurion_qualified_when_tribune_level_member_spotted_then_nearest_award_wins() {
    let cache = warm_cache(
        135,
        MemberLevel::Tribune,
        vec![newcomer("K5TRB", "41000T", MemberLevel::Tribune)],
        Vec::new(),
    );

    let result = SpotClassifier::default()
        .classify(&spot("K5TRB", Mode::Cw, NOW), &cache)
        .expect("spot is valid");

    // Centurion (135/100) and Tribune (135/50) are both complete; Senator is blocked.
    assert_eq!(result.tier, EligibilityTier::None);

    let pursuing = SpotClassifier::new(ClassifierConfig {
        pursue_endorsements: true,
        ..ClassifierConfig::default()
    });
    let result = pursuing
        .classify(&spot("K5TRB", Mode::Cw, NOW), &cache)
        .expect("spot is valid");
    assert_eq!(result.tier, EligibilityTier::High);
    assert_eq!(result.explanation, "Need 15 more for Tribune x3.");
    assert_eq!(result.contributions.len(), 2);
}

#[test]
fn given_distance_of_fifteen_when_classified_then_high() {
    let cache = warm_cache(
        85,
        MemberLevel::Member,
        vec![newcomer("N0NEW", "30000", MemberLevel::Member)],
        Vec::new(),
    );

    let result = SpotClassifier::default()
        .classify(&spot("N0NEW", Mode::Cw, NOW), &cache)
        .expect("spot is valid");
    assert_eq!(result.tier, EligibilityTier::High);
    assert_eq!(result.explanation, "Need 15 more for Centurion.");
}

#[test]
fn given_member_already_counted_long_ago_when_spotted_then_none() {
    let cache = warm_cache(98, MemberLevel::Member, Vec::new(), Vec::new());

    let result = SpotClassifier::default()
        .classify(&spot("W0007X", Mode::Cw, NOW), &cache)
        .expect("spot is valid");
    assert_eq!(result.tier, EligibilityTier::None);
}

#[test]
fn given_phone_spot_when_awards_are_cw_only_then_none() {
    let cache = warm_cache(
        98,
        MemberLevel::Member,
        vec![newcomer("N0NEW", "30000", MemberLevel::Member)],
        Vec::new(),
    );

    let result = SpotClassifier::default()
        .classify(&spot("N0NEW", Mode::Ssb, NOW), &cache)
        .expect("spot is valid");
    assert_eq!(result.tier, EligibilityTier::None);
}

#[test]
fn given_fixed_generation_when_same_spot_classified_twice_then_results_are_identical() {
    let cache = warm_cache(
        60,
        MemberLevel::Member,
        vec![newcomer("N0NEW", "30000", MemberLevel::Member)],
        Vec::new(),
    );
    let classifier = SpotClassifier::default();
    let candidate = spot("N0NEW", Mode::Cw, NOW);

    let first = classifier.classify(&candidate, &cache).expect("spot is valid");
    let second = classifier.classify(&candidate, &cache).expect("spot is valid");
    assert_eq!(first, second);
}

#[test]
fn given_spot_without_station_when_classified_then_validation_error() {
    let cache = warm_cache(1, MemberLevel::Member, Vec::new(), Vec::new());
    let classifier = SpotClassifier::default();

    let err = classifier
        .classify(&spot("  ", Mode::Cw, NOW), &cache)
        .expect_err("empty station must be rejected");
    assert_eq!(err, ValidationError::MissingStationId);

    let mut bad_frequency = spot("N0NEW", Mode::Cw, NOW);
    bad_frequency.frequency_khz = f64::NAN;
    assert!(matches!(
        classifier.classify(&bad_frequency, &cache),
        Err(ValidationError::InvalidFrequency(_))
    ));
}

#[test]
fn given_cold_cache_when_classified_then_none_with_explanation_and_refresh_scheduled() {
    let (entries, history) = worked_members("W", 98, MemberLevel::Member);
    let (cache, _, roster) = seeded_cache(entries, history);
    roster.upsert(newcomer("N0NEW", "30000", MemberLevel::Member));

    let result = SpotClassifier::default()
        .classify(&spot("N0NEW", Mode::Cw, NOW), &cache)
        .expect("spot is valid");
    assert_eq!(result.tier, EligibilityTier::None);
    assert_eq!(result.explanation, COLD_CACHE_EXPLANATION);
    assert!(result.generation.is_none());

    // The consistent read waits for the scheduled refresh instead of racing it.
    cache.get_snapshot().expect("snapshot should build");
    let result = SpotClassifier::default()
        .classify(&spot("N0NEW", Mode::Cw, NOW), &cache)
        .expect("spot is valid");
    assert_eq!(result.tier, EligibilityTier::Critical);
}

#[test]
fn given_roster_failure_when_classified_then_none_with_warning() {
    let roster: Arc<dyn RosterLookup> = Arc::new(FailingRoster);
    let cache = cache_with(
        Arc::new(InMemoryContactHistory::new()),
        roster,
        Arc::new(ManualClock::new(NOW)),
    );
    cache.get_snapshot().expect("snapshot should build");

    let result = SpotClassifier::default()
        .classify(&spot("N0NEW", Mode::Cw, NOW), &cache)
        .expect("spot is valid");
    assert_eq!(result.tier, EligibilityTier::None);
    assert_eq!(result.explanation, ROSTER_UNAVAILABLE_EXPLANATION);
}

fn plain_row(id: &str, name: &str, prerequisites: Vec<Prerequisite>, target: u32) -> AwardRow {
    AwardRow {
        id: id.to_string(),
        name: name.to_string(),
        prerequisites,
        target,
        rule: EligibilityRule::default(),
        unique_key: UniqueKeyRule::StationId,
        endorsements: Vec::new(),
        endorsement_step: None,
    }
}

#[test]
fn given_root_and_downstream_award_at_equal_distance_when_classified_then_root_is_named() {
    // The downstream row comes first in the table; prerequisite order still wins.
    let registry = AwardRegistry::from_rows(vec![
        plain_row("downstream", "Downstream", vec![Prerequisite::qualified("root")], 3),
        plain_row("root", "Root", Vec::new(), 1),
        plain_row("zeta", "Zeta", Vec::new(), 3),
    ])
    .expect("table should load");
    let worked = member("W1AAA", "100", MemberLevel::Member, date!(2010 - 01 - 01));
    let roster = InMemoryRoster::from_entries([
        RosterEntry::current(worked),
        newcomer("N0NEW", "30000", MemberLevel::Member),
    ]);
    let history =
        InMemoryContactHistory::from_contacts([cw_contact("W1AAA", "100", NOW - Duration::days(90))]);
    let cache = Arc::new(EligibilityCache::with_clock(
        Arc::new(registry),
        Arc::new(history),
        Arc::new(roster),
        Arc::new(ManualClock::new(NOW)),
        CacheConfig::default(),
    ));
    cache.get_snapshot().expect("snapshot should build");

    let result = SpotClassifier::default()
        .classify(&spot("N0NEW", Mode::Cw, NOW), &cache)
        .expect("spot is valid");

    assert_eq!(result.tier, EligibilityTier::Critical);
    assert_eq!(result.explanation, "Need 2 more for Zeta.");
    let ids: Vec<&str> = result
        .contributions
        .iter()
        .map(|contribution| contribution.award_id.as_str())
        .collect();
    assert_eq!(ids, vec!["zeta", "downstream"]);
}

#[test]
fn given_member_known_to_use_a_bug_when_spotted_then_triple_key_bug_contributes() {
    let mut bug_operator = newcomer("K4BUG", "31000", MemberLevel::Member);
    bug_operator.record.key_type = Some(KeyType::Bug);
    let cache = warm_cache(135, MemberLevel::Member, vec![bug_operator], Vec::new());

    let result = SpotClassifier::default()
        .classify(&spot("K4BUG", Mode::Cw, NOW), &cache)
        .expect("spot is valid");
    assert_eq!(result.tier, EligibilityTier::Medium);
    assert_eq!(result.explanation, "Need 100 more for Triple Key (Bug).");
    assert_eq!(result.contributions.len(), 1);
    assert_eq!(result.contributions[0].award_id, TRIPLE_KEY_BUG);

    let mut keyer_spot = spot("K4BUG", Mode::Cw, NOW);
    keyer_spot.key_type = Some(KeyType::from("keyer"));
    let result = SpotClassifier::default()
        .classify(&keyer_spot, &cache)
        .expect("spot is valid");
    assert_eq!(result.tier, EligibilityTier::None);
}
