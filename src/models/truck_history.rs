use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HistoryKind {
    Assignment,
    Maintenance,
    StatusChange,
}

impl HistoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryKind::Assignment => "assignment",
            HistoryKind::Maintenance => "maintenance",
            HistoryKind::StatusChange => "status_change",
        }
    }
}

impl fmt::Display for HistoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryKind {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "assignment" => Ok(HistoryKind::Assignment),
            "maintenance" => Ok(HistoryKind::Maintenance),
            "status_change" => Ok(HistoryKind::StatusChange),
            other => Err(format!("unknown history type '{other}'")),
        }
    }
}

/// One row of a truck's audit trail. Rows are never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TruckHistoryEvent {
    pub truck_history_id: i64,
    pub truck_id: i64,
    pub driver_id: Option<i64>,
    pub date: DateTime<FixedOffset>,
    #[serde(rename = "type")]
    pub kind: HistoryKind,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub truck_id: i64,
    pub driver_id: Option<i64>,
    pub kind: HistoryKind,
    pub notes: Option<String>,
    pub at: DateTime<Utc>,
}
