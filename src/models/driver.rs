use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::optional_calendar_day;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub driver_id: i64,
    pub driver_code: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, with = "optional_calendar_day")]
    pub start_date: Option<NaiveDate>,
    pub truck_id: Option<i64>,
    pub driver_type_id: Option<i64>,
    pub profile_pic: Option<String>,
}

/// Client-supplied driver fields for create and update.
///
/// `truck_id` is not written directly: changes to it go through the
/// assignment coordinator.
#[derive(Debug, Clone, Deserialize)]
pub struct DriverFields {
    pub driver_code: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, with = "optional_calendar_day")]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub truck_id: Option<i64>,
    #[serde(default)]
    pub driver_type_id: Option<i64>,
    #[serde(default)]
    pub profile_pic: Option<String>,
}

impl DriverFields {
    pub fn into_driver(self, driver_id: i64) -> Driver {
        Driver {
            driver_id,
            driver_code: self.driver_code,
            first_name: self.first_name,
            last_name: self.last_name,
            start_date: self.start_date,
            truck_id: self.truck_id,
            driver_type_id: self.driver_type_id,
            profile_pic: self.profile_pic,
        }
    }
}
