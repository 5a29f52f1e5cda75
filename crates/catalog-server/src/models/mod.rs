//! Catalog models
//!
//! Three shapes per entity: the attribute set a caller supplies (`*Attrs`),
//! the persisted row carrying its surrogate ref, and the nested views handed
//! back to API clients with every surrogate stripped.

pub mod coverage;
pub mod validation;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

macro_rules! surrogate_ref {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
        )]
        #[serde(transparent)]
        #[sqlx(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

surrogate_ref!(
    /// Surrogate identity of an organism row
    OrganismRef
);
surrogate_ref!(
    /// Surrogate identity of a pfam row
    PfamRef
);
surrogate_ref!(
    /// Surrogate identity of a protein row
    ProteinRef
);
surrogate_ref!(
    /// Surrogate identity of a domain row
    DomainRef
);

// ============================================================================
// Attribute sets
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganismAttrs {
    pub taxa_id: i64,
    pub clade: String,
    pub genus: String,
    pub species: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PfamAttrs {
    pub domain_id: String,
    pub domain_description: String,
}

/// Protein attributes; the owning organism is supplied separately on insert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProteinAttrs {
    pub protein_id: String,
    pub sequence: String,
    pub length: i64,
}

/// Domain attributes; the owning pfam is supplied separately on insert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainAttrs {
    pub description: String,
    pub start: i64,
    pub stop: i64,
}

// ============================================================================
// Persisted rows
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Organism {
    pub id: OrganismRef,
    pub taxa_id: i64,
    pub clade: String,
    pub genus: String,
    pub species: String,
}

impl Organism {
    pub fn new(id: OrganismRef, attrs: OrganismAttrs) -> Self {
        Self {
            id,
            taxa_id: attrs.taxa_id,
            clade: attrs.clade,
            genus: attrs.genus,
            species: attrs.species,
        }
    }

    pub fn attrs(&self) -> OrganismAttrs {
        OrganismAttrs {
            taxa_id: self.taxa_id,
            clade: self.clade.clone(),
            genus: self.genus.clone(),
            species: self.species.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Pfam {
    pub id: PfamRef,
    pub domain_id: String,
    pub domain_description: String,
}

impl Pfam {
    pub fn new(id: PfamRef, attrs: PfamAttrs) -> Self {
        Self {
            id,
            domain_id: attrs.domain_id,
            domain_description: attrs.domain_description,
        }
    }

    pub fn attrs(&self) -> PfamAttrs {
        PfamAttrs {
            domain_id: self.domain_id.clone(),
            domain_description: self.domain_description.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Protein {
    pub id: ProteinRef,
    pub protein_id: String,
    pub sequence: String,
    pub length: i64,
    #[sqlx(rename = "organism_ref")]
    pub organism: OrganismRef,
}

impl Protein {
    pub fn new(id: ProteinRef, attrs: ProteinAttrs, organism: OrganismRef) -> Self {
        Self {
            id,
            protein_id: attrs.protein_id,
            sequence: attrs.sequence,
            length: attrs.length,
            organism,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Domain {
    pub id: DomainRef,
    #[sqlx(rename = "pfam_ref")]
    pub pfam: PfamRef,
    pub description: String,
    #[sqlx(rename = "start_pos")]
    pub start: i64,
    #[sqlx(rename = "stop_pos")]
    pub stop: i64,
}

impl Domain {
    pub fn new(id: DomainRef, attrs: DomainAttrs, pfam: PfamRef) -> Self {
        Self {
            id,
            pfam,
            description: attrs.description,
            start: attrs.start,
            stop: attrs.stop,
        }
    }

    /// Number of residues the domain spans
    pub fn span(&self) -> i64 {
        self.stop - self.start
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromRow)]
pub struct ProteinDomain {
    #[sqlx(rename = "protein_ref")]
    pub protein: ProteinRef,
    #[sqlx(rename = "domain_ref")]
    pub domain: DomainRef,
}

/// A domain together with the pfam it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainAnnotation {
    pub domain: Domain,
    pub pfam: Pfam,
}

// ============================================================================
// Nested records and views
// ============================================================================

/// One protein with its organism and domain annotations
///
/// Accepted by the upsert path and returned, with the same shape, by the
/// protein detail query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProteinRecord {
    pub protein_id: String,
    #[serde(default)]
    pub sequence: String,
    pub length: i64,
    pub organism: OrganismAttrs,
    #[serde(default)]
    pub domains: Vec<DomainRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainRecord {
    pub pfam: PfamAttrs,
    pub description: String,
    pub start: i64,
    pub stop: i64,
}

impl ProteinRecord {
    pub fn protein_attrs(&self) -> ProteinAttrs {
        ProteinAttrs {
            protein_id: self.protein_id.clone(),
            sequence: self.sequence.clone(),
            length: self.length,
        }
    }

    /// Assemble the view of a persisted protein
    pub fn from_parts(protein: &Protein, organism: &Organism, annotations: &[DomainAnnotation]) -> Self {
        Self {
            protein_id: protein.protein_id.clone(),
            sequence: protein.sequence.clone(),
            length: protein.length,
            organism: organism.attrs(),
            domains: annotations.iter().map(DomainRecord::from_annotation).collect(),
        }
    }
}

impl DomainRecord {
    pub fn domain_attrs(&self) -> DomainAttrs {
        DomainAttrs {
            description: self.description.clone(),
            start: self.start,
            stop: self.stop,
        }
    }

    pub fn from_annotation(annotation: &DomainAnnotation) -> Self {
        Self {
            pfam: annotation.pfam.attrs(),
            description: annotation.domain.description.clone(),
            start: annotation.domain.start,
            stop: annotation.domain.stop,
        }
    }
}

/// Protein identity as listed under an organism
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProteinSummary {
    pub id: ProteinRef,
    pub protein_id: String,
}

impl From<&Protein> for ProteinSummary {
    fn from(protein: &Protein) -> Self {
        Self {
            id: protein.id,
            protein_id: protein.protein_id.clone(),
        }
    }
}
