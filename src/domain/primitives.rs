//! Domain primitives: ids, enums and timestamps.

use serde::{Deserialize, Serialize};

/// Time in milliseconds since Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeMs(pub i64);

impl TimeMs {
    pub fn new(ms: i64) -> Self {
        TimeMs(ms)
    }

    pub fn now() -> Self {
        TimeMs(chrono::Utc::now().timestamp_millis())
    }

    pub fn as_ms(&self) -> i64 {
        self.0
    }
}

/// Stable player identifier assigned by the upstream registration system.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        PlayerId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a recorded match, owned by the upstream match recorder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchId(pub String);

impl MatchId {
    pub fn new(id: impl Into<String>) -> Self {
        MatchId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ISO-style currency code. Normalized to uppercase on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyCode(pub String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        CurrencyCode(code.into().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Participant gender, used only for gender-bonus eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gender::Female => write!(f, "female"),
            Gender::Male => write!(f, "male"),
        }
    }
}

impl std::str::FromStr for Gender {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "female" => Ok(Gender::Female),
            "male" => Ok(Gender::Male),
            _ => Err(()),
        }
    }
}

/// Tournament tier; each maps to a fixed ranking multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TournamentTier {
    Club,
    Regional,
    National,
    International,
}

impl std::fmt::Display for TournamentTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentTier::Club => write!(f, "club"),
            TournamentTier::Regional => write!(f, "regional"),
            TournamentTier::National => write!(f, "national"),
            TournamentTier::International => write!(f, "international"),
        }
    }
}

/// Match format. Mixed is doubles with one participant of each gender per side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchFormat {
    Singles,
    Doubles,
    Mixed,
}

impl MatchFormat {
    /// Required number of players per side.
    pub fn side_size(&self) -> usize {
        match self {
            MatchFormat::Singles => 1,
            MatchFormat::Doubles | MatchFormat::Mixed => 2,
        }
    }
}

impl std::fmt::Display for MatchFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchFormat::Singles => write!(f, "singles"),
            MatchFormat::Doubles => write!(f, "doubles"),
            MatchFormat::Mixed => write!(f, "mixed"),
        }
    }
}

/// Competition pool. Youth and adult pools are strictly isolated: a youth
/// match never reads or writes an adult ledger, and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgePool {
    Adult,
    Youth,
}

impl std::fmt::Display for AgePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgePool::Adult => write!(f, "adult"),
            AgePool::Youth => write!(f, "youth"),
        }
    }
}

impl std::str::FromStr for AgePool {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "adult" => Ok(AgePool::Adult),
            "youth" => Ok(AgePool::Youth),
            _ => Err(()),
        }
    }
}
