pub mod list;
pub mod pfams;
pub mod proteins;

pub use pfams::OrganismPfamsQuery;
pub use proteins::OrganismProteinsQuery;
