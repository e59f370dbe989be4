//! Persistence gateway: pooled SQLite access, schema bootstrap, and one
//! module of parameterized statements plus row mapping per table.

pub mod driver_types;
pub mod drivers;
pub mod pool;
pub mod rows;
pub mod safety_categories;
pub mod safety_events;
pub mod schema;
pub mod scorecard_events;
pub mod scorecard_metrics;
pub mod truck_history;
pub mod trucks;
