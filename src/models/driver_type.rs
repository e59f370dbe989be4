use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverType {
    pub driver_type_id: i64,
    pub driver_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DriverTypeFields {
    pub driver_type: String,
}

impl DriverTypeFields {
    pub fn into_driver_type(self, driver_type_id: i64) -> DriverType {
        DriverType {
            driver_type_id,
            driver_type: self.driver_type,
        }
    }
}
