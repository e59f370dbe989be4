use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TruckStatus {
    #[default]
    Available,
    Maintenance,
    Assigned,
}

impl TruckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TruckStatus::Available => "available",
            TruckStatus::Maintenance => "maintenance",
            TruckStatus::Assigned => "assigned",
        }
    }
}

impl fmt::Display for TruckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TruckStatus {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "available" => Ok(TruckStatus::Available),
            "maintenance" => Ok(TruckStatus::Maintenance),
            "assigned" => Ok(TruckStatus::Assigned),
            other => Err(format!("unknown truck status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Truck {
    pub truck_id: i64,
    pub unit_number: String,
    pub year: i64,
    pub status: TruckStatus,
}

/// Client-supplied truck fields for create and update.
#[derive(Debug, Clone, Deserialize)]
pub struct TruckFields {
    pub unit_number: String,
    pub year: i64,
    #[serde(default)]
    pub status: TruckStatus,
}

impl TruckFields {
    pub fn into_truck(self, truck_id: i64) -> Truck {
        Truck {
            truck_id,
            unit_number: self.unit_number,
            year: self.year,
            status: self.status,
        }
    }
}
