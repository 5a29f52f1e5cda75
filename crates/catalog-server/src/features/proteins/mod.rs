pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::CreateProteinCommand;
pub use queries::GetProteinQuery;
pub use routes::proteins_routes;
