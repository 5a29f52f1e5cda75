pub mod get;

pub use get::{CoverageResponse, GetCoverageQuery};
