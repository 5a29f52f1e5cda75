//! Common types used across the catalog

use serde::{Deserialize, Serialize};

use crate::error::CommonError;

/// The five kinds of entity held in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Organism,
    Pfam,
    Protein,
    Domain,
    ProteinDomain,
}

impl EntityKind {
    /// Every kind, in insertion dependency order
    pub const INSERT_ORDER: [EntityKind; 5] = [
        EntityKind::Pfam,
        EntityKind::Organism,
        EntityKind::Protein,
        EntityKind::Domain,
        EntityKind::ProteinDomain,
    ];

    /// Every kind, in an order that never deletes a referenced row first
    pub const RESET_ORDER: [EntityKind; 5] = [
        EntityKind::ProteinDomain,
        EntityKind::Domain,
        EntityKind::Protein,
        EntityKind::Pfam,
        EntityKind::Organism,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Organism => "organism",
            EntityKind::Pfam => "pfam",
            EntityKind::Protein => "protein",
            EntityKind::Domain => "domain",
            EntityKind::ProteinDomain => "protein_domain",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "organism" => Ok(EntityKind::Organism),
            "pfam" => Ok(EntityKind::Pfam),
            "protein" => Ok(EntityKind::Protein),
            "domain" => Ok(EntityKind::Domain),
            "protein_domain" | "proteindomain" => Ok(EntityKind::ProteinDomain),
            _ => Err(CommonError::Parse(format!("Invalid entity kind: {}", s))),
        }
    }
}

/// Role a bulk source file plays in a load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceRole {
    /// `[domain_id, domain_description]`
    Pfams,
    /// `[protein_id, taxa_id, clade, genus_species, description, pfam_id, start, stop, length]`
    Proteins,
    /// `[protein_id, sequence]`
    Sequences,
}

impl SourceRole {
    pub const ALL: [SourceRole; 3] = [SourceRole::Pfams, SourceRole::Proteins, SourceRole::Sequences];

    /// Number of columns a well-formed row carries
    pub fn expected_fields(&self) -> usize {
        match self {
            SourceRole::Pfams => 2,
            SourceRole::Proteins => 9,
            SourceRole::Sequences => 2,
        }
    }

    /// File name used when no path is configured for this role
    pub fn default_file_name(&self) -> &'static str {
        match self {
            SourceRole::Pfams => "pfam_descriptions.csv",
            SourceRole::Proteins => "assignment_data_set.csv",
            SourceRole::Sequences => "assignment_data_sequences.csv",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceRole::Pfams => "pfams",
            SourceRole::Proteins => "proteins",
            SourceRole::Sequences => "sequences",
        }
    }
}

impl std::fmt::Display for SourceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceRole {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pfams" | "pfam" => Ok(SourceRole::Pfams),
            "proteins" | "protein" => Ok(SourceRole::Proteins),
            "sequences" | "sequence" => Ok(SourceRole::Sequences),
            _ => Err(CommonError::Parse(format!("Invalid source role: {}", s))),
        }
    }
}
