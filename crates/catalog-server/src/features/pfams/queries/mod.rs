pub mod domains;
pub mod get;
pub mod list;

pub use domains::PfamDomainsQuery;
pub use get::GetPfamQuery;
