pub mod assignment;
pub mod locks;
pub mod scorecard_filter;
pub mod stats;
