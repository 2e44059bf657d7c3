pub mod dashboard;
pub mod forecast;
pub mod types;

pub use dashboard::*;
pub use forecast::*;
pub use types::*;
