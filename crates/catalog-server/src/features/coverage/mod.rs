pub mod queries;
pub mod routes;

pub use queries::{CoverageResponse, GetCoverageQuery};
pub use routes::coverage_routes;
