//! Entity graph builder for bulk sources
//!
//! Turns the three flat sources into deduplicated, referentially intact
//! entity sets ready for insertion. Rows are fed in three passes: pfams,
//! then composite annotation rows, then sequences.

use std::collections::HashMap;

use catalog_common::sources::RawRow;
use catalog_common::{EntityKind, SourceRole};
use serde::Serialize;
use tracing::{debug, warn};

use super::registry::NaturalKeyRegistry;
use crate::error::{CatalogError, CatalogResult};
use crate::models::validation::{
    validate_domain, validate_organism, validate_pfam, validate_protein_header, ValidationRule,
};
use crate::models::{
    Domain, DomainAttrs, DomainRef, Organism, OrganismAttrs, OrganismRef, Pfam, PfamAttrs, PfamRef,
    Protein, ProteinAttrs, ProteinDomain, ProteinRef,
};
use crate::storage::EntityRows;

// Composite row columns
const COL_PROTEIN_ID: usize = 0;
const COL_TAXA_ID: usize = 1;
const COL_CLADE: usize = 2;
const COL_GENUS_SPECIES: usize = 3;
const COL_DESCRIPTION: usize = 4;
const COL_PFAM_ID: usize = 5;
const COL_START: usize = 6;
const COL_STOP: usize = 7;
const COL_LENGTH: usize = 8;

/// A source row left out of the graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    pub role: SourceRole,
    pub line: u64,
    pub reason: String,
}

/// Normalized output of one bulk build
#[derive(Debug, Default)]
pub struct EntityGraph {
    pub organisms: Vec<Organism>,
    pub pfams: Vec<Pfam>,
    pub proteins: Vec<Protein>,
    pub domains: Vec<Domain>,
    pub links: Vec<ProteinDomain>,
    pub skipped_rows: Vec<SkippedRow>,
    /// Sequence rows whose protein_id matched no protein
    pub dropped_sequences: usize,
}

impl EntityGraph {
    pub fn len(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Organism => self.organisms.len(),
            EntityKind::Pfam => self.pfams.len(),
            EntityKind::Protein => self.proteins.len(),
            EntityKind::Domain => self.domains.len(),
            EntityKind::ProteinDomain => self.links.len(),
        }
    }

    /// Proteins no sequence row was found for
    pub fn unsequenced_proteins(&self) -> usize {
        self.proteins.iter().filter(|p| p.sequence.is_empty()).count()
    }

    /// Rows of one kind split into insert batches of at most `size`
    pub fn batches(&self, kind: EntityKind, size: usize) -> Vec<EntityRows<'_>> {
        let size = size.max(1);
        match kind {
            EntityKind::Organism => self.organisms.chunks(size).map(EntityRows::Organisms).collect(),
            EntityKind::Pfam => self.pfams.chunks(size).map(EntityRows::Pfams).collect(),
            EntityKind::Protein => self.proteins.chunks(size).map(EntityRows::Proteins).collect(),
            EntityKind::Domain => self.domains.chunks(size).map(EntityRows::Domains).collect(),
            EntityKind::ProteinDomain => self.links.chunks(size).map(EntityRows::Links).collect(),
        }
    }
}

/// Incremental builder over raw source rows
#[derive(Debug)]
pub struct GraphBuilder {
    organism_keys: NaturalKeyRegistry<i64, OrganismRef>,
    pfam_keys: NaturalKeyRegistry<String, PfamRef>,
    protein_keys: NaturalKeyRegistry<String, ProteinRef>,
    protein_slots: HashMap<ProteinRef, usize>,
    next_domain: i64,
    graph: EntityGraph,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            organism_keys: NaturalKeyRegistry::new(EntityKind::Organism),
            pfam_keys: NaturalKeyRegistry::new(EntityKind::Pfam),
            protein_keys: NaturalKeyRegistry::new(EntityKind::Protein),
            protein_slots: HashMap::new(),
            next_domain: 1,
            graph: EntityGraph::default(),
        }
    }

    /// Pfam source row: `[domain_id, domain_description]`
    ///
    /// Any bad pfam row is fatal. A repeated `domain_id` keeps the first
    /// description seen.
    pub fn add_pfam_row(&mut self, row: &RawRow) -> CatalogResult<PfamRef> {
        require_fields(row, SourceRole::Pfams)?;

        let attrs = PfamAttrs {
            domain_id: field(row, 0).to_string(),
            domain_description: field(row, 1).to_string(),
        };

        let pfams = &mut self.graph.pfams;
        self.pfam_keys.resolve(attrs.domain_id.clone(), |id| {
            validate_pfam(&attrs)?;
            pfams.push(Pfam::new(id, attrs));
            Ok::<_, CatalogError>(())
        })
    }

    /// Composite source row
    ///
    /// `[protein_id, taxa_id, clade, genus_species, description, pfam_id, start, stop, length]`
    ///
    /// Returns `Err` only for failures that must abort the load: a short or
    /// undecodable row, or a bad organism or pfam reference. Domain and
    /// protein failures skip the row and are recorded on the graph.
    pub fn add_composite_row(&mut self, row: &RawRow) -> CatalogResult<()> {
        require_fields(row, SourceRole::Proteins)?;

        let organism = self.resolve_organism(row)?;

        let pfam_id = field(row, COL_PFAM_ID);
        let pfam = self
            .pfam_keys
            .get(pfam_id)
            .ok_or_else(|| CatalogError::not_found(EntityKind::Pfam, pfam_id))?;

        match self.add_annotation(row, organism, pfam) {
            Ok(()) => Ok(()),
            Err(err @ (CatalogError::Validation(_) | CatalogError::MalformedInput { .. })) => {
                warn!(line = row.line, error = %err, "Skipping composite row");
                self.skip(SourceRole::Proteins, row.line, err.to_string());
                Ok(())
            },
            Err(err) => Err(err),
        }
    }

    /// Sequence source row: `[protein_id, sequence]`
    ///
    /// Never fails. Rows for unknown proteins are dropped and counted. Short,
    /// undecodable and blank-sequence rows are skipped and recorded.
    pub fn add_sequence_row(&mut self, row: &RawRow) {
        if let Some(reason) = &row.undecodable {
            self.skip(SourceRole::Sequences, row.line, reason.clone());
            return;
        }
        if !row.is_complete_for(SourceRole::Sequences) {
            self.skip(
                SourceRole::Sequences,
                row.line,
                format!(
                    "expected {} fields, found {}",
                    SourceRole::Sequences.expected_fields(),
                    row.fields.len()
                ),
            );
            return;
        }

        let protein_id = field(row, 0);
        let Some(slot) = self
            .protein_keys
            .get(protein_id)
            .and_then(|id| self.protein_slots.get(&id).copied())
        else {
            debug!(line = row.line, protein_id, "Dropping sequence for unknown protein");
            self.graph.dropped_sequences += 1;
            return;
        };

        let sequence = field(row, 1);
        if sequence.is_empty() {
            self.skip(
                SourceRole::Sequences,
                row.line,
                ValidationRule::SequenceBlank.message().to_string(),
            );
            return;
        }

        self.graph.proteins[slot].sequence = sequence.to_string();
    }

    pub fn finish(self) -> EntityGraph {
        self.graph
    }

    fn resolve_organism(&mut self, row: &RawRow) -> CatalogResult<OrganismRef> {
        let taxa_id: i64 = parse_int(row, COL_TAXA_ID, "taxa_id")?;

        if let Some(existing) = self.organism_keys.get(&taxa_id) {
            return Ok(existing);
        }

        let genus_species = field(row, COL_GENUS_SPECIES);
        let (genus, species) = genus_species
            .split_once(char::is_whitespace)
            .map(|(genus, species)| (genus, species.trim()))
            .filter(|(_, species)| !species.is_empty())
            .ok_or_else(|| {
                CatalogError::malformed(
                    SourceRole::Proteins,
                    row.line,
                    format!("genus_species '{genus_species}' needs a genus and a species"),
                )
            })?;

        let attrs = OrganismAttrs {
            taxa_id,
            clade: field(row, COL_CLADE).to_string(),
            genus: genus.to_string(),
            species: species.to_string(),
        };

        let organisms = &mut self.graph.organisms;
        self.organism_keys.resolve(taxa_id, |id| {
            validate_organism(&attrs)?;
            organisms.push(Organism::new(id, attrs));
            Ok::<_, CatalogError>(())
        })
    }

    fn add_annotation(&mut self, row: &RawRow, organism: OrganismRef, pfam: PfamRef) -> CatalogResult<()> {
        let domain = DomainAttrs {
            description: field(row, COL_DESCRIPTION).to_string(),
            start: parse_int(row, COL_START, "start")?,
            stop: parse_int(row, COL_STOP, "stop")?,
        };
        validate_domain(&domain)?;

        // Header columns only matter on the first row for a protein
        let protein_id = field(row, COL_PROTEIN_ID).to_string();
        let proteins = &mut self.graph.proteins;
        let slots = &mut self.protein_slots;
        let protein_ref = self.protein_keys.resolve(protein_id.clone(), |id| {
            let protein = ProteinAttrs {
                protein_id,
                sequence: String::new(),
                length: parse_int(row, COL_LENGTH, "length")?,
            };
            validate_protein_header(&protein)?;
            slots.insert(id, proteins.len());
            proteins.push(Protein::new(id, protein, organism));
            Ok::<_, CatalogError>(())
        })?;

        let domain_ref = DomainRef(self.next_domain);
        self.next_domain += 1;
        self.graph.domains.push(Domain::new(domain_ref, domain, pfam));
        self.graph.links.push(ProteinDomain {
            protein: protein_ref,
            domain: domain_ref,
        });
        Ok(())
    }

    fn skip(&mut self, role: SourceRole, line: u64, reason: String) {
        self.graph.skipped_rows.push(SkippedRow { role, line, reason });
    }
}

/// Build the graph from all three sources in pass order
pub fn build_bulk_graph(
    pfam_rows: &[RawRow],
    composite_rows: &[RawRow],
    sequence_rows: &[RawRow],
) -> CatalogResult<EntityGraph> {
    let mut builder = GraphBuilder::new();

    for row in pfam_rows {
        builder.add_pfam_row(row)?;
    }
    for row in composite_rows {
        builder.add_composite_row(row)?;
    }
    for row in sequence_rows {
        builder.add_sequence_row(row);
    }

    let graph = builder.finish();
    debug!(
        organisms = graph.organisms.len(),
        pfams = graph.pfams.len(),
        proteins = graph.proteins.len(),
        domains = graph.domains.len(),
        skipped = graph.skipped_rows.len(),
        "Built entity graph"
    );
    Ok(graph)
}

fn require_fields(row: &RawRow, role: SourceRole) -> CatalogResult<()> {
    if let Some(reason) = &row.undecodable {
        return Err(CatalogError::malformed(role, row.line, reason.clone()));
    }
    if row.is_complete_for(role) {
        Ok(())
    } else {
        Err(CatalogError::malformed(
            role,
            row.line,
            format!(
                "expected {} fields, found {}",
                role.expected_fields(),
                row.fields.len()
            ),
        ))
    }
}

fn field(row: &RawRow, index: usize) -> &str {
    row.field(index).map(str::trim).unwrap_or_default()
}

fn parse_int(row: &RawRow, index: usize, name: &str) -> CatalogResult<i64> {
    let raw = field(row, index);
    raw.parse().map_err(|_| {
        CatalogError::malformed(
            SourceRole::Proteins,
            row.line,
            format!("{name} '{raw}' is not an integer"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(line: u64, fields: &[&str]) -> RawRow {
        RawRow::new(line, fields.iter().map(|f| f.to_string()).collect())
    }

    fn composite(line: u64, protein_id: &str, taxa_id: &str, pfam_id: &str, start: &str, stop: &str) -> RawRow {
        row(
            line,
            &[
                protein_id,
                taxa_id,
                "E",
                "Ancylostoma ceylanicum",
                "Peptidase C13 legumain",
                pfam_id,
                start,
                stop,
                "101",
            ],
        )
    }

    fn builder_with_pfams(ids: &[&str]) -> GraphBuilder {
        let mut builder = GraphBuilder::new();
        for (i, id) in ids.iter().enumerate() {
            builder.add_pfam_row(&row(i as u64 + 2, &[id, "description"])).unwrap();
        }
        builder
    }

    #[test]
    fn test_organisms_deduplicated_by_taxa_id() {
        let mut builder = builder_with_pfams(&["PF00001"]);
        let taxa = ["1", "2", "3", "1", "2", "3", "1"];
        for (i, taxa_id) in taxa.iter().enumerate() {
            let protein_id = format!("P{i}");
            builder
                .add_composite_row(&composite(i as u64 + 2, &protein_id, taxa_id, "PF00001", "1", "10"))
                .unwrap();
        }

        let graph = builder.finish();
        assert_eq!(graph.organisms.len(), 3);
        assert_eq!(graph.proteins.len(), 7);
        assert_eq!(graph.organisms[0].genus, "Ancylostoma");
        assert_eq!(graph.organisms[0].species, "ceylanicum");
    }

    #[test]
    fn test_shared_pfam_yields_distinct_domains() {
        let mut builder = builder_with_pfams(&["PF01650"]);
        for i in 0..5 {
            builder
                .add_composite_row(&composite(i + 2, "A0A016S8J7", "53326", "PF01650", "10", "20"))
                .unwrap();
        }

        let graph = builder.finish();
        assert_eq!(graph.pfams.len(), 1);
        assert_eq!(graph.domains.len(), 5);
        assert_eq!(graph.proteins.len(), 1);
        assert_eq!(graph.links.len(), 5);
        assert!(graph.domains.iter().all(|d| d.pfam == graph.pfams[0].id));
    }

    #[test]
    fn test_first_protein_occurrence_wins() {
        let mut builder = builder_with_pfams(&["PF00001"]);
        let mut first = composite(2, "A0A016S8J7", "53326", "PF00001", "1", "10");
        first.fields[COL_LENGTH] = "101".to_string();
        let mut second = composite(3, "A0A016S8J7", "53326", "PF00001", "20", "30");
        second.fields[COL_LENGTH] = "999".to_string();

        builder.add_composite_row(&first).unwrap();
        builder.add_composite_row(&second).unwrap();

        let graph = builder.finish();
        assert_eq!(graph.proteins.len(), 1);
        assert_eq!(graph.proteins[0].length, 101);
        assert_eq!(graph.links.len(), 2);
    }

    #[test]
    fn test_repeat_protein_ignores_its_length_column() {
        let mut builder = builder_with_pfams(&["PF00001"]);
        let mut repeat = composite(3, "A0A016S8J7", "53326", "PF00001", "20", "30");
        repeat.fields[COL_LENGTH] = "x".to_string();

        builder
            .add_composite_row(&composite(2, "A0A016S8J7", "53326", "PF00001", "1", "10"))
            .unwrap();
        builder.add_composite_row(&repeat).unwrap();

        let graph = builder.finish();
        assert_eq!(graph.proteins.len(), 1);
        assert_eq!(graph.proteins[0].length, 101);
        assert_eq!(graph.domains.len(), 2);
        assert!(graph.skipped_rows.is_empty());
    }

    #[test]
    fn test_invalid_domain_skips_row() {
        let mut builder = builder_with_pfams(&["PF00001"]);
        builder
            .add_composite_row(&composite(2, "A0A016S8J7", "53326", "PF00001", "30", "10"))
            .unwrap();
        builder
            .add_composite_row(&composite(3, "A0A016S8J8", "53326", "PF00001", "x", "10"))
            .unwrap();

        let graph = builder.finish();
        assert!(graph.domains.is_empty());
        assert!(graph.proteins.is_empty());
        assert_eq!(graph.skipped_rows.len(), 2);
        assert_eq!(graph.skipped_rows[0].line, 2);
        assert_eq!(graph.skipped_rows[1].role, SourceRole::Proteins);
        // The organism itself was valid and stays
        assert_eq!(graph.organisms.len(), 1);
    }

    #[test]
    fn test_unknown_pfam_aborts() {
        let mut builder = builder_with_pfams(&["PF00001"]);
        let err = builder
            .add_composite_row(&composite(2, "A0A016S8J7", "53326", "PF99999", "1", "10"))
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { kind: EntityKind::Pfam, ref key } if key == "PF99999"));
    }

    #[test]
    fn test_bad_organism_aborts() {
        let mut builder = builder_with_pfams(&["PF00001"]);

        let err = builder
            .add_composite_row(&composite(2, "A0A016S8J7", "human", "PF00001", "1", "10"))
            .unwrap_err();
        assert!(matches!(err, CatalogError::MalformedInput { line: 2, .. }));

        let err = builder
            .add_composite_row(&composite(3, "A0A016S8J7", "-4", "PF00001", "1", "10"))
            .unwrap_err();
        assert!(matches!(err, CatalogError::Validation(f) if f.rule == ValidationRule::TaxaIdNotPositive));

        let mut unsplittable = composite(4, "A0A016S8J7", "53326", "PF00001", "1", "10");
        unsplittable.fields[COL_GENUS_SPECIES] = "Ancylostoma".to_string();
        let err = builder.add_composite_row(&unsplittable).unwrap_err();
        assert!(matches!(err, CatalogError::MalformedInput { line: 4, .. }));
    }

    #[test]
    fn test_short_rows_abort() {
        let mut builder = GraphBuilder::new();
        let err = builder.add_pfam_row(&row(2, &["PF00001"])).unwrap_err();
        assert!(matches!(err, CatalogError::MalformedInput { role: SourceRole::Pfams, .. }));

        let err = builder.add_composite_row(&row(3, &["A0A016S8J7", "53326"])).unwrap_err();
        assert!(matches!(err, CatalogError::MalformedInput { role: SourceRole::Proteins, .. }));
    }

    #[test]
    fn test_undecodable_rows() {
        let mut builder = GraphBuilder::new();
        let err = builder
            .add_pfam_row(&RawRow::undecodable(2, "invalid UTF-8"))
            .unwrap_err();
        assert!(matches!(err, CatalogError::MalformedInput { role: SourceRole::Pfams, line: 2, .. }));

        let mut builder = builder_with_pfams(&["PF00001"]);
        let err = builder
            .add_composite_row(&RawRow::undecodable(3, "invalid UTF-8"))
            .unwrap_err();
        assert!(matches!(err, CatalogError::MalformedInput { role: SourceRole::Proteins, line: 3, .. }));

        builder
            .add_composite_row(&composite(2, "A0A016S8J7", "53326", "PF00001", "1", "10"))
            .unwrap();
        builder.add_sequence_row(&RawRow::undecodable(2, "invalid UTF-8"));

        let graph = builder.finish();
        assert_eq!(graph.unsequenced_proteins(), 1);
        assert_eq!(graph.skipped_rows.len(), 1);
        assert_eq!(graph.skipped_rows[0].role, SourceRole::Sequences);
        assert_eq!(graph.skipped_rows[0].line, 2);
    }

    #[test]
    fn test_sequence_pass() {
        let mut builder = builder_with_pfams(&["PF00001"]);
        builder
            .add_composite_row(&composite(2, "A0A016S8J7", "53326", "PF00001", "1", "10"))
            .unwrap();
        builder
            .add_composite_row(&composite(3, "A0A016S8J8", "53326", "PF00001", "1", "10"))
            .unwrap();

        builder.add_sequence_row(&row(2, &["A0A016S8J7", "MVIGLSTLLA"]));
        builder.add_sequence_row(&row(3, &["UNKNOWN", "MHVQ"]));
        builder.add_sequence_row(&row(4, &["A0A016S8J8", ""]));
        builder.add_sequence_row(&row(5, &["A0A016S8J8"]));

        let graph = builder.finish();
        assert_eq!(graph.proteins.len(), 2);
        assert_eq!(graph.proteins[0].sequence, "MVIGLSTLLA");
        assert_eq!(graph.dropped_sequences, 1);
        assert_eq!(graph.unsequenced_proteins(), 1);
        assert_eq!(graph.skipped_rows.len(), 2);
        assert!(graph.skipped_rows.iter().all(|s| s.role == SourceRole::Sequences));
    }

    #[test]
    fn test_batches() {
        let mut builder = builder_with_pfams(&["PF00001", "PF00002", "PF00003", "PF00004", "PF00005"]);
        builder
            .add_composite_row(&composite(2, "A0A016S8J7", "53326", "PF00001", "1", "10"))
            .unwrap();
        let graph = builder.finish();

        let batches = graph.batches(EntityKind::Pfam, 2);
        assert_eq!(batches.len(), 3);
        assert_eq!(batches.iter().map(EntityRows::len).sum::<usize>(), 5);
        assert!(graph.batches(EntityKind::Organism, 0).len() == 1);
        assert_eq!(graph.len(EntityKind::ProteinDomain), 1);
    }

    #[test]
    fn test_build_bulk_graph() {
        let pfams = vec![row(2, &["PF00001", "7tm_1"]), row(3, &["PF00002", "7tm_2"])];
        let composites = vec![
            composite(2, "A0A016S8J7", "53326", "PF00001", "1", "10"),
            composite(3, "A0A016S8J7", "53326", "PF00002", "20", "40"),
            composite(4, "A0A014PQC0", "1344", "PF00002", "5", "8"),
        ];
        let sequences = vec![row(2, &["A0A016S8J7", "MVIG"]), row(3, &["A0A014PQC0", "MHVQ"])];

        let graph = build_bulk_graph(&pfams, &composites, &sequences).unwrap();
        assert_eq!(graph.pfams.len(), 2);
        assert_eq!(graph.organisms.len(), 2);
        assert_eq!(graph.proteins.len(), 2);
        assert_eq!(graph.domains.len(), 3);
        assert_eq!(graph.unsequenced_proteins(), 0);
        assert!(graph.skipped_rows.is_empty());
    }
}
