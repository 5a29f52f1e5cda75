pub mod queries;
pub mod routes;

pub use queries::{OrganismPfamsQuery, OrganismProteinsQuery};
pub use routes::organisms_routes;
