use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GeckoError;

/// Selectable chart ranges, in days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum ChartRange {
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

impl ChartRange {
    pub const ALL: [ChartRange; 4] = [
        ChartRange::Week,
        ChartRange::Month,
        ChartRange::Quarter,
        ChartRange::Year,
    ];

    pub fn days(self) -> u32 {
        match self {
            ChartRange::Week => 7,
            ChartRange::Month => 30,
            ChartRange::Quarter => 90,
            ChartRange::Year => 365,
        }
    }

    /// The next range in [`ChartRange::ALL`], wrapping around.
    pub fn next(self) -> Self {
        match self {
            ChartRange::Week => ChartRange::Month,
            ChartRange::Month => ChartRange::Quarter,
            ChartRange::Quarter => ChartRange::Year,
            ChartRange::Year => ChartRange::Week,
        }
    }
}

impl TryFrom<u32> for ChartRange {
    type Error = GeckoError;

    fn try_from(days: u32) -> Result<Self, Self::Error> {
        match days {
            7 => Ok(ChartRange::Week),
            30 => Ok(ChartRange::Month),
            90 => Ok(ChartRange::Quarter),
            365 => Ok(ChartRange::Year),
            other => Err(GeckoError::InvalidRange(other)),
        }
    }
}

impl From<ChartRange> for u32 {
    fn from(r: ChartRange) -> Self {
        r.days()
    }
}

impl FromStr for ChartRange {
    type Err = GeckoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches('d');
        let days: u32 = trimmed
            .parse()
            .map_err(|_| GeckoError::Config(format!("invalid range: {s}")))?;
        ChartRange::try_from(days)
    }
}

impl std::fmt::Display for ChartRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}d", self.days())
    }
}

/// Direction of a period-over-period change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increase,
    Decrease,
}

impl Trend {
    /// Zero counts as an increase.
    pub fn classify(percent_change: f64) -> Self {
        if percent_change >= 0.0 {
            Trend::Increase
        } else {
            Trend::Decrease
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trend::Increase => write!(f, "increase"),
            Trend::Decrease => write!(f, "decrease"),
        }
    }
}
