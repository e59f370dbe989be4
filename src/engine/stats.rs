use serde::Serialize;

use crate::models::safety::SafetyTotals;

/// Summed bonus scores above this mark a driver as `Warning`.
pub const WARNING_BONUS_THRESHOLD: i64 = 5;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum DriverStanding {
    Good,
    Warning,
}

pub fn standing_for(total_bonus_score: i64) -> DriverStanding {
    if total_bonus_score > WARNING_BONUS_THRESHOLD {
        DriverStanding::Warning
    } else {
        DriverStanding::Good
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DriverStats {
    pub event_count: i64,
    pub total_bonus_score: i64,
    #[serde(rename = "totalPIScore")]
    pub total_pi_score: i64,
    pub status: DriverStanding,
}

impl From<SafetyTotals> for DriverStats {
    fn from(totals: SafetyTotals) -> Self {
        Self {
            event_count: totals.event_count,
            total_bonus_score: totals.total_bonus_score,
            total_pi_score: totals.total_pi_score,
            status: standing_for(totals.total_bonus_score),
        }
    }
}
