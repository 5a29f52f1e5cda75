pub mod get;
pub mod list;

pub use get::GetProteinQuery;
