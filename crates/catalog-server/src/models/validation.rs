//! Per-entity invariants
//!
//! Pure predicates run before an entity is considered materialized. Each
//! failure names the entity kind and a stable rule code that API clients and
//! load reports can match on.

use catalog_common::EntityKind;
use serde::Serialize;
use thiserror::Error;

use super::{DomainAttrs, OrganismAttrs, PfamAttrs, ProteinAttrs};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationRule {
    TaxaIdNotPositive,
    GenusBlank,
    SpeciesBlank,
    CladeBlank,
    DomainIdBlank,
    DomainDescriptionBlank,
    ProteinIdBlank,
    LengthNotPositive,
    SequenceBlank,
    StartNotPositive,
    StopNotPositive,
    StartNotBeforeStop,
}

impl ValidationRule {
    /// Stable reason code
    pub fn code(&self) -> &'static str {
        match self {
            ValidationRule::TaxaIdNotPositive => "taxa_id_not_positive",
            ValidationRule::GenusBlank => "genus_blank",
            ValidationRule::SpeciesBlank => "species_blank",
            ValidationRule::CladeBlank => "clade_blank",
            ValidationRule::DomainIdBlank => "domain_id_blank",
            ValidationRule::DomainDescriptionBlank => "domain_description_blank",
            ValidationRule::ProteinIdBlank => "protein_id_blank",
            ValidationRule::LengthNotPositive => "length_not_positive",
            ValidationRule::SequenceBlank => "sequence_blank",
            ValidationRule::StartNotPositive => "start_not_positive",
            ValidationRule::StopNotPositive => "stop_not_positive",
            ValidationRule::StartNotBeforeStop => "start_not_before_stop",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ValidationRule::TaxaIdNotPositive => "taxa_id must be greater than 0",
            ValidationRule::GenusBlank => "genus cannot be empty",
            ValidationRule::SpeciesBlank => "species cannot be empty",
            ValidationRule::CladeBlank => "clade cannot be empty",
            ValidationRule::DomainIdBlank => "domain_id cannot be empty",
            ValidationRule::DomainDescriptionBlank => "domain_description cannot be empty",
            ValidationRule::ProteinIdBlank => "protein_id cannot be empty",
            ValidationRule::LengthNotPositive => "length must be greater than 0",
            ValidationRule::SequenceBlank => "sequence cannot be empty",
            ValidationRule::StartNotPositive => "start must be greater than 0",
            ValidationRule::StopNotPositive => "stop must be greater than 0",
            ValidationRule::StartNotBeforeStop => "start must be less than stop",
        }
    }
}

impl std::fmt::Display for ValidationRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[error("Invalid {kind}: {}", .rule.message())]
pub struct ValidationFailure {
    pub kind: EntityKind,
    pub rule: ValidationRule,
}

impl ValidationFailure {
    pub fn new(kind: EntityKind, rule: ValidationRule) -> Self {
        Self { kind, rule }
    }
}

type Outcome = Result<(), ValidationFailure>;

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn check(kind: EntityKind, failed: bool, rule: ValidationRule) -> Outcome {
    if failed {
        Err(ValidationFailure::new(kind, rule))
    } else {
        Ok(())
    }
}

pub fn validate_organism(attrs: &OrganismAttrs) -> Outcome {
    let kind = EntityKind::Organism;
    check(kind, attrs.taxa_id <= 0, ValidationRule::TaxaIdNotPositive)?;
    check(kind, is_blank(&attrs.genus), ValidationRule::GenusBlank)?;
    check(kind, is_blank(&attrs.species), ValidationRule::SpeciesBlank)?;
    check(kind, is_blank(&attrs.clade), ValidationRule::CladeBlank)
}

pub fn validate_pfam(attrs: &PfamAttrs) -> Outcome {
    let kind = EntityKind::Pfam;
    check(kind, is_blank(&attrs.domain_id), ValidationRule::DomainIdBlank)?;
    check(kind, is_blank(&attrs.domain_description), ValidationRule::DomainDescriptionBlank)
}

/// Full protein check, used wherever the sequence is known up front
pub fn validate_protein(attrs: &ProteinAttrs) -> Outcome {
    validate_protein_header(attrs)?;
    check(EntityKind::Protein, is_blank(&attrs.sequence), ValidationRule::SequenceBlank)
}

/// Protein check without the sequence rule
///
/// Bulk loads learn a protein's sequence from a separate source after the
/// protein itself has been materialized.
pub fn validate_protein_header(attrs: &ProteinAttrs) -> Outcome {
    let kind = EntityKind::Protein;
    check(kind, is_blank(&attrs.protein_id), ValidationRule::ProteinIdBlank)?;
    check(kind, attrs.length <= 0, ValidationRule::LengthNotPositive)
}

pub fn validate_domain(attrs: &DomainAttrs) -> Outcome {
    let kind = EntityKind::Domain;
    check(kind, attrs.start <= 0, ValidationRule::StartNotPositive)?;
    check(kind, attrs.stop <= 0, ValidationRule::StopNotPositive)?;
    check(kind, attrs.start >= attrs.stop, ValidationRule::StartNotBeforeStop)
}
