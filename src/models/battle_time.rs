//! Battle timestamps and half-open time ranges.
//!
//! The game API stamps every battle as `YYYYMMDDTHHMMSS.sssZ` (UTC). That
//! string is stored untouched: it is fixed-width, so lexicographic order is
//! chronological order, and range filters compare the strings directly.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// chrono format of a battle timestamp.
pub const BATTLE_TIME_FORMAT: &str = "%Y%m%dT%H%M%S%.3fZ";

const BATTLE_TIME_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid battle time '{0}' (expected YYYYMMDDTHHMMSS.sssZ)")]
pub struct InvalidBattleTime(pub String);

/// A validated battle timestamp.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct BattleTime(String);

impl BattleTime {
    /// Validate a raw timestamp string.
    pub fn parse(raw: &str) -> Result<Self, InvalidBattleTime> {
        if raw.len() != BATTLE_TIME_LEN
            || NaiveDateTime::parse_from_str(raw, BATTLE_TIME_FORMAT).is_err()
        {
            return Err(InvalidBattleTime(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    /// Midnight UTC of a calendar date, in battle-time form.
    pub fn at_midnight(date: NaiveDate) -> Self {
        Self(date.and_time(chrono::NaiveTime::MIN).format(BATTLE_TIME_FORMAT).to_string())
    }

    /// Calendar date (UTC) of this timestamp.
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDateTime::parse_from_str(&self.0, BATTLE_TIME_FORMAT)
            .ok()
            .map(|dt| dt.date())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for BattleTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        BattleTime::parse(&raw).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for BattleTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for BattleTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BattleTime({})", self.0)
    }
}

/// Half-open range `[start, end)` over battle times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRange {
    pub start: BattleTime,
    pub end: BattleTime,
}

impl TimeRange {
    /// Range from midnight UTC of `start` (inclusive) to midnight UTC of
    /// `end` (exclusive). A range with `start == end` contains nothing.
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: BattleTime::at_midnight(start),
            end: BattleTime::at_midnight(end),
        }
    }

    pub fn contains(&self, time: &BattleTime) -> bool {
        self.start <= *time && *time < self.end
    }
}
