//! Dashboard analytics contracts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::risk::RiskLevel;
use crate::utils::de;

/// Window the dashboard aggregates over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum Timeframe {
    #[serde(rename = "7d")]
    Week,
    #[default]
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "90d")]
    Quarter,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Week => "7d",
            Timeframe::Month => "30d",
            Timeframe::Quarter => "90d",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "7d" => Ok(Timeframe::Week),
            "30d" => Ok(Timeframe::Month),
            "90d" => Ok(Timeframe::Quarter),
            other => Err(format!("unknown timeframe: {} (expected 7d, 30d or 90d)", other)),
        }
    }
}

/// Headline counts for the timeframe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Summary {
    #[serde(deserialize_with = "de::count_or_numeric_string")]
    pub total_screenings: u64,
    #[serde(deserialize_with = "de::count_or_numeric_string")]
    pub blocked_count: u64,
    #[serde(deserialize_with = "de::count_or_numeric_string")]
    pub warning_count: u64,
    #[serde(deserialize_with = "de::count_or_numeric_string")]
    pub clear_count: u64,
}

/// One day of the trend line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct DailyTrend {
    pub date: String,
    #[serde(deserialize_with = "de::count_or_numeric_string")]
    pub screenings: u64,
    #[serde(deserialize_with = "de::number_or_numeric_string")]
    pub avg_risk: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct RiskBucket {
    pub risk_level: RiskLevel,
    #[serde(deserialize_with = "de::count_or_numeric_string")]
    pub count: u64,
}

/// Aggregate snapshot; refetched per timeframe, never updated locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct DashboardAnalytics {
    pub summary: Summary,
    #[serde(default)]
    pub daily_trends: Vec<DailyTrend>,
    #[serde(default)]
    pub risk_distribution: Vec<RiskBucket>,
}

impl DashboardAnalytics {
    /// Percentage of the distribution falling in each bucket, in the
    /// order the service sent them. Empty distributions yield zeros.
    pub fn risk_share(&self) -> Vec<(RiskLevel, f64)> {
        let total: u64 = self.risk_distribution.iter().map(|b| b.count).sum();
        self.risk_distribution
            .iter()
            .map(|b| {
                let share = if total == 0 {
                    0.0
                } else {
                    b.count as f64 * 100.0 / total as f64
                };
                (b.risk_level, share)
            })
            .collect()
    }
}
