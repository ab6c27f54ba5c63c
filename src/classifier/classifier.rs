use std::sync::Arc;

use time::Duration;

use crate::{
    awards::AwardRegistry,
    cache::{EligibilityCache, EligibilitySnapshot},
    classifier::types::{ClassifierConfig, Contribution, EligibilityResult, EligibilityTier, Spot},
    error::ValidationError,
    roster::RosterLookup,
};

pub const COLD_CACHE_EXPLANATION: &str = "Award progress not yet available.";
pub const ROSTER_UNAVAILABLE_EXPLANATION: &str = "Roster lookup unavailable.";

/// Ranks spots by how far working the station would move the nearest award.
#[derive(Debug, Clone, Default)]
pub struct SpotClassifier {
    config: ClassifierConfig,
}

impl SpotClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classifies `spot` against the cache's last published snapshot. Never waits for a
    /// refresh: a stale or missing snapshot only schedules one.
    pub fn classify(
        &self,
        spot: &Spot,
        cache: &Arc<EligibilityCache>,
    ) -> Result<EligibilityResult, ValidationError> {
        spot.validate()?;

        let Some(snapshot) = cache.current() else {
            cache.request_refresh();
            return Ok(EligibilityResult::none(COLD_CACHE_EXPLANATION));
        };
        if cache.is_stale(&snapshot) {
            cache.request_refresh();
        }

        Ok(self.classify_against(
            spot,
            &snapshot,
            cache.registry(),
            cache.roster().as_ref(),
        ))
    }

    /// Classification against one fixed snapshot. Same inputs, same result.
    pub fn classify_against(
        &self,
        spot: &Spot,
        snapshot: &EligibilitySnapshot,
        registry: &AwardRegistry,
        roster: &dyn RosterLookup,
    ) -> EligibilityResult {
        let stamp = |mut result: EligibilityResult| {
            result.computed_at = Some(snapshot.computed_at());
            result.generation = Some(snapshot.generation());
            result
        };

        if let Some(last_worked) = snapshot.last_worked(&spot.station_id) {
            let age = spot.observed_at - last_worked;
            if age <= self.config.recent_window() {
                return stamp(EligibilityResult {
                    tier: EligibilityTier::Low,
                    contributions: Vec::new(),
                    explanation: format!(
                        "Worked {} (recent window {} days).",
                        age_phrase(age),
                        self.config.recent_window_days
                    ),
                    computed_at: None,
                    generation: None,
                });
            }
        }

        let member = match roster.find(&spot.station_id) {
            Ok(Some(member)) => member,
            Ok(None) => return stamp(EligibilityResult::none("")),
            Err(err) => {
                tracing::warn!(
                    target: "classifier",
                    station_id = %spot.station_id,
                    error = %err,
                    "roster_lookup_failed"
                );
                return stamp(EligibilityResult::none(ROSTER_UNAVAILABLE_EXPLANATION));
            }
        };

        let mut prospective = spot.as_prospective_contact();
        if prospective.key_type.is_none() {
            prospective.key_type = member.key_type.clone();
        }
        let mut contributions = Vec::new();
        let mut nearest: Option<(u32, String)> = None;

        for award in registry.iter() {
            let Some(progress) = snapshot.progress(&award.id) else {
                continue;
            };
            if !progress.is_computed() || !snapshot.prerequisites_satisfied(award) {
                continue;
            }
            if snapshot
                .counting_starts_after(award)
                .is_some_and(|after| prospective.timestamp <= after)
            {
                continue;
            }
            if !award.admits(&prospective, &member) {
                continue;
            }
            let Some(key) = award.unique_key.key_for_contact(&prospective, &member) else {
                continue;
            };
            if progress.has_counted(&key) {
                continue;
            }

            let (distance, goal) = if progress.distance() > 0 {
                (progress.distance(), award.name.clone())
            } else if self.config.pursue_endorsements {
                let count = progress.current_count();
                let Some(next) = award.next_endorsement(count) else {
                    continue;
                };
                (next.threshold.saturating_sub(count), next.label)
            } else {
                continue;
            };

            if nearest
                .as_ref()
                .is_none_or(|(best, _)| distance < *best)
            {
                nearest = Some((distance, goal));
            }
            contributions.push(Contribution {
                award_id: award.id.clone(),
                distance,
            });
        }

        let Some((distance, goal)) = nearest else {
            return stamp(EligibilityResult::none(""));
        };

        let result = stamp(EligibilityResult {
            tier: self.config.tier_for_distance(distance),
            contributions,
            explanation: format!("Need {distance} more for {goal}."),
            computed_at: None,
            generation: None,
        });
        tracing::trace!(
            target: "classifier",
            station_id = %spot.station_id,
            tier = %result.tier,
            distance = distance,
            "spot_classified"
        );
        result
    }
}

fn age_phrase(age: Duration) -> String {
    match age.whole_days() {
        days if days <= 0 => "today".to_string(),
        1 => "1 day ago".to_string(),
        days => format!("{days} days ago"),
    }
}
