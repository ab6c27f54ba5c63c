//! Membership numbers and roster levels.
//!
//! A membership number is a decimal base optionally followed by a level letter
//! (`C`, `T`, `S`) and an endorsement multiplier (`x2`, `x10`). Anything after the
//! first whitespace is ignored: `"12345Tx2"`, `"12345 Tx2"` and `"12345"` all name
//! member 12345.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberLevel {
    Member,
    Centurion,
    Tribune,
    Senator,
}

impl MemberLevel {
    pub const ALL: [MemberLevel; 4] = [
        MemberLevel::Member,
        MemberLevel::Centurion,
        MemberLevel::Tribune,
        MemberLevel::Senator,
    ];

    pub fn from_suffix(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'C' => Some(Self::Centurion),
            'T' => Some(Self::Tribune),
            'S' => Some(Self::Senator),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Centurion => "centurion",
            Self::Tribune => "tribune",
            Self::Senator => "senator",
        }
    }
}

impl fmt::Display for MemberLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "member" => Ok(Self::Member),
            "centurion" | "c" => Ok(Self::Centurion),
            "tribune" | "t" => Ok(Self::Tribune),
            "senator" | "s" => Ok(Self::Senator),
            other => Err(format!("unknown member level '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMembership {
    pub base: String,
    pub level: Option<MemberLevel>,
    pub multiplier: Option<u32>,
}

/// Splits a membership number into base, level letter and multiplier.
/// Returns `None` when there is no leading decimal base.
pub fn parse(raw: &str) -> Option<ParsedMembership> {
    let token = raw.split_whitespace().next()?;
    let digits_end = token
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(index, _)| index)
        .unwrap_or(token.len());
    if digits_end == 0 {
        return None;
    }

    let base = token[..digits_end].to_string();
    let mut rest = token[digits_end..].chars().peekable();

    let level = match rest.peek().copied() {
        Some(letter) if letter != 'x' && letter != 'X' => {
            rest.next();
            Some(MemberLevel::from_suffix(letter)?)
        }
        _ => None,
    };

    let multiplier = match rest.next() {
        None => None,
        Some('x') | Some('X') => {
            let tail: String = rest.collect();
            Some(tail.parse::<u32>().ok()?)
        }
        Some(_) => return None,
    };

    Some(ParsedMembership {
        base,
        level,
        multiplier,
    })
}

/// Base number with any level letter and multiplier stripped.
pub fn base_number(raw: &str) -> Option<String> {
    parse(raw).map(|parsed| parsed.base)
}

/// Uppercased, trimmed station identifier.
pub fn normalize_station_id(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// Station identifier with portable/operating prefixes and suffixes removed
/// (`W4GNS/P` and `VE3/W4GNS` both become `W4GNS`).
pub fn base_station_id(raw: &str) -> String {
    let normalized = normalize_station_id(raw);
    normalized
        .split('/')
        .max_by_key(|part| part.len())
        .unwrap_or_default()
        .to_string()
}
