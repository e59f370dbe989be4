use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::calendar_day;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScoreCardCategory {
    Safety,
    Maintenance,
    Dispatch,
}

impl ScoreCardCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreCardCategory::Safety => "SAFETY",
            ScoreCardCategory::Maintenance => "MAINTENANCE",
            ScoreCardCategory::Dispatch => "DISPATCH",
        }
    }
}

impl fmt::Display for ScoreCardCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoreCardCategory {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "SAFETY" => Ok(ScoreCardCategory::Safety),
            "MAINTENANCE" => Ok(ScoreCardCategory::Maintenance),
            "DISPATCH" => Ok(ScoreCardCategory::Dispatch),
            other => Err(format!("unknown scorecard category '{other}'")),
        }
    }
}

/// A scorecard metric definition. `driver_type_id = None` applies to every
/// driver type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreCardItem {
    pub sc_category_id: i64,
    pub sc_category: ScoreCardCategory,
    pub sc_description: String,
    pub driver_type_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoreCardItemFields {
    pub sc_category: ScoreCardCategory,
    #[serde(default)]
    pub sc_description: String,
    #[serde(default)]
    pub driver_type_id: Option<i64>,
}

impl ScoreCardItemFields {
    pub fn into_item(self, sc_category_id: i64) -> ScoreCardItem {
        ScoreCardItem {
            sc_category_id,
            sc_category: self.sc_category,
            sc_description: self.sc_description,
            driver_type_id: self.driver_type_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreCardEvent {
    pub scorecard_event_id: i64,
    pub driver_id: i64,
    #[serde(with = "calendar_day")]
    pub event_date: NaiveDate,
    pub sc_category_id: i64,
    pub sc_score: i64,
    pub notes: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoreCardEventFields {
    pub driver_id: i64,
    #[serde(with = "calendar_day")]
    pub event_date: NaiveDate,
    pub sc_category_id: i64,
    #[serde(default)]
    pub sc_score: i64,
    #[serde(default)]
    pub notes: String,
}

impl ScoreCardEventFields {
    pub fn into_event(self, scorecard_event_id: i64) -> ScoreCardEvent {
        ScoreCardEvent {
            scorecard_event_id,
            driver_id: self.driver_id,
            event_date: self.event_date,
            sc_category_id: self.sc_category_id,
            sc_score: self.sc_score,
            notes: self.notes,
        }
    }
}
