pub mod pagination;

pub use pagination::{Paginated, PaginationMetadata, PaginationParams};
