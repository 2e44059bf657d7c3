pub mod forecast;
pub mod kpi;
pub mod metrics;
pub mod model;
pub mod trainer;
