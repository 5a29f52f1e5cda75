pub mod queries;
pub mod routes;

pub use queries::{GetPfamQuery, PfamDomainsQuery};
pub use routes::pfams_routes;
