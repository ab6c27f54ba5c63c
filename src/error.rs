use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::awards::AwardId;

/// Fatal problems in the award table. Initialization aborts on any of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("award table is empty")]
    EmptyRegistry,
    #[error("award id cannot be empty")]
    EmptyAwardId,
    #[error("duplicate award id '{0}'")]
    DuplicateAward(AwardId),
    #[error("award '{award}' is invalid: {reason}")]
    InvalidDefinition { award: AwardId, reason: String },
    #[error("award '{award}' requires unknown prerequisite '{prerequisite}'")]
    UnknownPrerequisite {
        award: AwardId,
        prerequisite: AwardId,
    },
    #[error("prerequisite cycle: {}", .0.join(" -> "))]
    PrerequisiteCycle(Vec<AwardId>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Roster,
    History,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Roster => "roster",
            Self::History => "history",
        }
    }
}

/// A collaborator (roster or history) could not be reached. Always recoverable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} unavailable: {message}", .origin.as_str())]
pub struct DataAccessError {
    pub origin: DataSource,
    pub message: String,
}

impl DataAccessError {
    pub fn roster(message: impl Into<String>) -> Self {
        Self {
            origin: DataSource::Roster,
            message: message.into(),
        }
    }

    pub fn history(message: impl Into<String>) -> Self {
        Self {
            origin: DataSource::History,
            message: message.into(),
        }
    }
}

/// A single malformed spot or contact. The offending item is skipped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("spot is missing a station id")]
    MissingStationId,
    #[error("frequency {0} is not a valid kHz value")]
    InvalidFrequency(f64),
    #[error("contact at {timestamp} is missing a station id")]
    ContactMissingStationId { timestamp: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    #[error(transparent)]
    DataAccess(#[from] DataAccessError),
    #[error("refresh cancelled before the snapshot was swapped in")]
    Cancelled,
}
