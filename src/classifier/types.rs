use std::fmt;

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{
    awards::AwardId,
    error::ValidationError,
    history::{ContactRecord, KeyType, Mode},
};

/// Priority of a spot, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EligibilityTier {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl EligibilityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for EligibilityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One sighting of a station on the air.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spot {
    pub station_id: String,
    pub frequency_khz: f64,
    pub mode: Mode,
    #[serde(with = "time::serde::rfc3339")]
    pub observed_at: OffsetDateTime,
    #[serde(default)]
    pub source: String,
    /// Key the spotted operator is using, when the spot source reports it.
    #[serde(default)]
    pub key_type: Option<KeyType>,
}

impl Spot {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.station_id.trim().is_empty() {
            return Err(ValidationError::MissingStationId);
        }
        if !self.frequency_khz.is_finite() || self.frequency_khz < 0.0 {
            return Err(ValidationError::InvalidFrequency(self.frequency_khz));
        }
        Ok(())
    }

    /// The contact that would be logged if this spot were worked right now.
    pub fn as_prospective_contact(&self) -> ContactRecord {
        ContactRecord {
            station_id: self.station_id.clone(),
            timestamp: self.observed_at,
            mode: self.mode.clone(),
            membership_number: None,
            band: None,
            key_type: self.key_type.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    pub award_id: AwardId,
    pub distance: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityResult {
    pub tier: EligibilityTier,
    pub contributions: Vec<Contribution>,
    pub explanation: String,
    /// When the snapshot this result was derived from was computed. `None` on a cold cache.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub computed_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub generation: Option<u64>,
}

impl EligibilityResult {
    pub fn none(explanation: impl Into<String>) -> Self {
        Self {
            tier: EligibilityTier::None,
            contributions: Vec::new(),
            explanation: explanation.into(),
            computed_at: None,
            generation: None,
        }
    }

    pub fn is_actionable(&self) -> bool {
        self.tier >= EligibilityTier::Medium
    }
}

fn default_recent_window_days() -> u32 {
    30
}

fn default_critical_max_distance() -> u32 {
    5
}

fn default_high_max_distance() -> u32 {
    20
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_recent_window_days")]
    pub recent_window_days: u32,
    #[serde(default = "default_critical_max_distance")]
    pub critical_max_distance: u32,
    #[serde(default = "default_high_max_distance")]
    pub high_max_distance: u32,
    /// Let qualified awards contribute the distance to their next endorsement.
    #[serde(default)]
    pub pursue_endorsements: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            recent_window_days: default_recent_window_days(),
            critical_max_distance: default_critical_max_distance(),
            high_max_distance: default_high_max_distance(),
            pursue_endorsements: false,
        }
    }
}

impl ClassifierConfig {
    pub fn recent_window(&self) -> Duration {
        Duration::days(i64::from(self.recent_window_days))
    }

    pub fn tier_for_distance(&self, distance: u32) -> EligibilityTier {
        if distance <= self.critical_max_distance {
            EligibilityTier::Critical
        } else if distance <= self.high_max_distance {
            EligibilityTier::High
        } else {
            EligibilityTier::Medium
        }
    }
}
