use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::calendar_day;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyCategory {
    pub category_id: i64,
    pub code: String,
    pub description: String,
    pub scoring_system: i64,
    pub p_i_score: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SafetyCategoryFields {
    pub code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub scoring_system: i64,
    #[serde(default)]
    pub p_i_score: i64,
}

impl SafetyCategoryFields {
    pub fn into_category(self, category_id: i64) -> SafetyCategory {
        SafetyCategory {
            category_id,
            code: self.code,
            description: self.description,
            scoring_system: self.scoring_system,
            p_i_score: self.p_i_score,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyEvent {
    pub safety_event_id: i64,
    pub driver_id: i64,
    #[serde(with = "calendar_day")]
    pub event_date: NaiveDate,
    pub category_id: i64,
    pub notes: String,
    pub bonus_score: i64,
    pub p_i_score: i64,
    pub bonus_period: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SafetyEventFields {
    pub driver_id: i64,
    #[serde(with = "calendar_day")]
    pub event_date: NaiveDate,
    pub category_id: i64,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub bonus_score: i64,
    #[serde(default)]
    pub p_i_score: i64,
    #[serde(default)]
    pub bonus_period: bool,
}

impl SafetyEventFields {
    pub fn into_event(self, safety_event_id: i64) -> SafetyEvent {
        SafetyEvent {
            safety_event_id,
            driver_id: self.driver_id,
            event_date: self.event_date,
            category_id: self.category_id,
            notes: self.notes,
            bonus_score: self.bonus_score,
            p_i_score: self.p_i_score,
            bonus_period: self.bonus_period,
        }
    }
}

/// Raw per-driver aggregates over safety events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SafetyTotals {
    pub event_count: i64,
    pub total_bonus_score: i64,
    pub total_pi_score: i64,
}
