pub mod driver;
pub mod driver_type;
pub mod safety;
pub mod scorecard;
pub mod truck;
pub mod truck_history;
