use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{error::ValidationError, membership::normalize_station_id};

/// Operating mode. Unknown modes are kept verbatim (uppercased).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Mode {
    Cw,
    Ssb,
    Ft8,
    Rtty,
    Other(String),
}

impl Mode {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Cw => "CW",
            Self::Ssb => "SSB",
            Self::Ft8 => "FT8",
            Self::Rtty => "RTTY",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Mode {
    fn from(value: String) -> Self {
        let upper = value.trim().to_ascii_uppercase();
        match upper.as_str() {
            "CW" => Self::Cw,
            "SSB" | "USB" | "LSB" => Self::Ssb,
            "FT8" => Self::Ft8,
            "RTTY" => Self::Rtty,
            _ => Self::Other(upper),
        }
    }
}

impl From<&str> for Mode {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<Mode> for String {
    fn from(value: Mode) -> Self {
        value.as_str().to_string()
    }
}

impl FromStr for Mode {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(value))
    }
}

/// Mechanical key used on the other end of a contact. Exchanges abbreviate these as
/// SK, BUG and SS.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum KeyType {
    Straight,
    Bug,
    Sideswiper,
    /// Keyers, keyboards and anything else.
    Other(String),
}

impl KeyType {
    pub const MECHANICAL: [KeyType; 3] = [Self::Straight, Self::Bug, Self::Sideswiper];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Straight => "STRAIGHT",
            Self::Bug => "BUG",
            Self::Sideswiper => "SIDESWIPER",
            Self::Other(name) => name,
        }
    }

    pub fn is_mechanical(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for KeyType {
    fn from(value: String) -> Self {
        let upper = value.trim().to_ascii_uppercase();
        match upper.as_str() {
            "STRAIGHT" | "SK" => Self::Straight,
            "BUG" => Self::Bug,
            "SIDESWIPER" | "SS" => Self::Sideswiper,
            _ => Self::Other(upper),
        }
    }
}

impl From<&str> for KeyType {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<KeyType> for String {
    fn from(value: KeyType) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub station_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub mode: Mode,
    /// Membership number as exchanged on the air, suffix included.
    #[serde(default)]
    pub membership_number: Option<String>,
    #[serde(default)]
    pub band: Option<String>,
    /// Key the other operator reported. Unknown for most logs.
    #[serde(default)]
    pub key_type: Option<KeyType>,
}

impl ContactRecord {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.station_id.trim().is_empty() {
            return Err(ValidationError::ContactMissingStationId {
                timestamp: self.timestamp.to_string(),
            });
        }
        Ok(())
    }

    pub fn normalized_station_id(&self) -> String {
        normalize_station_id(&self.station_id)
    }
}

/// Query passed to the history store once per refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    pub since: Option<OffsetDateTime>,
    pub modes: Option<Vec<Mode>>,
}

impl HistoryFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn matches(&self, contact: &ContactRecord) -> bool {
        if let Some(since) = self.since
            && contact.timestamp < since
        {
            return false;
        }
        match &self.modes {
            Some(modes) => modes.contains(&contact.mode),
            None => true,
        }
    }
}
