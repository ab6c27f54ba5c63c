//! The award table shipped with the crate. New awards are appended as rows here or
//! in the `awards.extra` section of the config file.

use std::collections::BTreeSet;

use time::macros::date;

use crate::{
    awards::types::{AwardRow, Endorsement, EligibilityRule, Prerequisite, UniqueKeyRule},
    history::{KeyType, Mode},
    membership::MemberLevel,
};

pub const CENTURION: &str = "centurion";
pub const TRIBUNE: &str = "tribune";
pub const SENATOR: &str = "senator";
pub const TRIPLE_KEY_STRAIGHT: &str = "triple_key_straight";
pub const TRIPLE_KEY_BUG: &str = "triple_key_bug";
pub const TRIPLE_KEY_SIDESWIPER: &str = "triple_key_sideswiper";

/// Club and special-event calls that never count toward Senator.
pub const SPECIAL_EVENT_CALLS: [&str; 2] = ["K9SKC", "K3Y"];

fn ladder(name: &str, steps: &[(u32, u32)]) -> Vec<Endorsement> {
    steps
        .iter()
        .map(|&(threshold, multiple)| {
            if multiple == 1 {
                Endorsement::new(threshold, name)
            } else {
                Endorsement::new(threshold, format!("{name} x{multiple}"))
            }
        })
        .collect()
}

fn levels(levels: &[MemberLevel]) -> BTreeSet<MemberLevel> {
    levels.iter().copied().collect()
}

pub fn builtin_rows() -> Vec<AwardRow> {
    vec![
        AwardRow {
            id: CENTURION.to_string(),
            name: "Centurion".to_string(),
            prerequisites: Vec::new(),
            target: 100,
            rule: EligibilityRule {
                modes: vec![Mode::Cw],
                require_membership_at_contact: true,
                ..EligibilityRule::default()
            },
            unique_key: UniqueKeyRule::MembershipBase,
            endorsements: ladder(
                "Centurion",
                &[
                    (100, 1),
                    (200, 2),
                    (300, 3),
                    (400, 4),
                    (500, 5),
                    (600, 6),
                    (700, 7),
                    (800, 8),
                    (900, 9),
                    (1000, 10),
                    (1500, 15),
                    (2000, 20),
                    (2500, 25),
                    (3000, 30),
                    (3500, 35),
                    (4000, 40),
                ],
            ),
            endorsement_step: Some(500),
        },
        AwardRow {
            id: TRIBUNE.to_string(),
            name: "Tribune".to_string(),
            prerequisites: vec![Prerequisite::qualified(CENTURION)],
            target: 50,
            rule: EligibilityRule {
                modes: vec![Mode::Cw],
                min_date: Some(date!(2007 - 03 - 01)),
                accepted_levels: levels(&[
                    MemberLevel::Centurion,
                    MemberLevel::Tribune,
                    MemberLevel::Senator,
                ]),
                require_membership_at_contact: true,
                ..EligibilityRule::default()
            },
            unique_key: UniqueKeyRule::MembershipBase,
            endorsements: ladder(
                "Tribune",
                &[
                    (50, 1),
                    (100, 2),
                    (150, 3),
                    (200, 4),
                    (250, 5),
                    (300, 6),
                    (350, 7),
                    (400, 8),
                    (450, 9),
                    (500, 10),
                    (750, 15),
                    (1000, 20),
                    (1250, 25),
                    (1500, 30),
                ],
            ),
            endorsement_step: Some(250),
        },
        AwardRow {
            id: SENATOR.to_string(),
            name: "Senator".to_string(),
            prerequisites: vec![Prerequisite::after_reaching(TRIBUNE, 400)],
            target: 200,
            rule: EligibilityRule {
                modes: vec![Mode::Cw],
                min_date: Some(date!(2013 - 08 - 01)),
                accepted_levels: levels(&[MemberLevel::Tribune, MemberLevel::Senator]),
                require_membership_at_contact: true,
                excluded_stations: SPECIAL_EVENT_CALLS
                    .iter()
                    .map(|call| call.to_string())
                    .collect(),
                key_types: KeyType::MECHANICAL.into_iter().collect(),
                key_type_required: false,
            },
            unique_key: UniqueKeyRule::MembershipBase,
            endorsements: ladder(
                "Senator",
                &[
                    (200, 1),
                    (400, 2),
                    (600, 3),
                    (800, 4),
                    (1000, 5),
                    (1200, 6),
                    (1400, 7),
                    (1600, 8),
                    (1800, 9),
                    (2000, 10),
                ],
            ),
            endorsement_step: Some(200),
        },
        triple_key_row(TRIPLE_KEY_STRAIGHT, "Triple Key (Straight)", KeyType::Straight),
        triple_key_row(TRIPLE_KEY_BUG, "Triple Key (Bug)", KeyType::Bug),
        triple_key_row(TRIPLE_KEY_SIDESWIPER, "Triple Key (Sideswiper)", KeyType::Sideswiper),
    ]
}

/// Triple Key is earned once all three of these rows qualify: 100 members worked
/// with each mechanical key.
fn triple_key_row(id: &str, name: &str, key: KeyType) -> AwardRow {
    AwardRow {
        id: id.to_string(),
        name: name.to_string(),
        prerequisites: Vec::new(),
        target: 100,
        rule: EligibilityRule {
            modes: vec![Mode::Cw],
            min_date: Some(date!(2018 - 11 - 10)),
            require_membership_at_contact: true,
            key_types: BTreeSet::from([key]),
            key_type_required: true,
            ..EligibilityRule::default()
        },
        unique_key: UniqueKeyRule::MembershipBase,
        endorsements: Vec::new(),
        endorsement_step: None,
    }
}
