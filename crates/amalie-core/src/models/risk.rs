//! Scoring vocabulary shared by screening and monitoring results.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::utils::capitalize;

/// Scores at or above this are high risk
const HIGH_RISK_THRESHOLD: u8 = 70;

/// Scores at or above this (and below high) are medium risk
const MEDIUM_RISK_THRESHOLD: u8 = 40;

/// An integer in 0..=100, used for risk scores and confidence.
///
/// Whole-valued floats are accepted; anything outside the range is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "u8")]
pub struct Percentage(u8);

impl Percentage {
    pub const MAX: u8 = 100;

    pub fn new(value: u8) -> Option<Self> {
        (value <= Self::MAX).then_some(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<f64> for Percentage {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if value.fract() != 0.0 || !(0.0..=f64::from(Self::MAX)).contains(&value) {
            return Err(format!("expected an integer between 0 and 100, found {}", value));
        }
        Ok(Self(value as u8))
    }
}

impl From<Percentage> for u8 {
    fn from(p: Percentage) -> Self {
        p.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Outcome of a screening or monitoring check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum RiskStatus {
    Clear,
    Warning,
    Blocked,
    Pending,
    Flagged,
}

impl RiskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskStatus::Clear => "clear",
            RiskStatus::Warning => "warning",
            RiskStatus::Blocked => "blocked",
            RiskStatus::Pending => "pending",
            RiskStatus::Flagged => "flagged",
        }
    }

    /// Display label ("Blocked")
    pub fn label(&self) -> String {
        capitalize(self.as_str())
    }

    /// Whether the status calls for an analyst's attention
    pub fn needs_review(&self) -> bool {
        matches!(self, RiskStatus::Warning | RiskStatus::Blocked | RiskStatus::Flagged)
    }
}

impl fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for RiskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "clear" => Ok(RiskStatus::Clear),
            "warning" => Ok(RiskStatus::Warning),
            "blocked" => Ok(RiskStatus::Blocked),
            "pending" => Ok(RiskStatus::Pending),
            "flagged" => Ok(RiskStatus::Flagged),
            other => Err(format!("unknown status: {}", other)),
        }
    }
}

/// Risk band used by the analytics distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: Percentage) -> Self {
        match score.value() {
            s if s >= HIGH_RISK_THRESHOLD => RiskLevel::High,
            s if s >= MEDIUM_RISK_THRESHOLD => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}
