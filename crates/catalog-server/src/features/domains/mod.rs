pub mod queries;
pub mod routes;

pub use routes::domains_routes;
