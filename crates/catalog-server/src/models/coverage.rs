//! Domain coverage of a protein

use super::{Domain, Protein};
use crate::error::CatalogError;

/// Fraction of a protein's length covered by its domains
///
/// Computed as `sum(stop - start) / length`. Overlapping domains are counted
/// once each, so the ratio can exceed 1.0; it is returned as is.
pub fn coverage(protein: &Protein, domains: &[Domain]) -> Result<f64, CatalogError> {
    if protein.length <= 0 {
        return Err(CatalogError::UndefinedCoverage {
            protein_id: protein.protein_id.clone(),
        });
    }

    // Wide accumulator: many long spans can exceed i64
    let covered: i128 = domains
        .iter()
        .map(|d| i128::from(d.stop) - i128::from(d.start))
        .sum();
    Ok(covered as f64 / protein.length as f64)
}
