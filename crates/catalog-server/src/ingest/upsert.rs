//! Single-record upsert
//!
//! Persists one nested protein record. Organisms and pfams are reused when
//! their natural key is already stored; the protein and its domains are
//! always new.

use std::collections::HashMap;

use catalog_common::EntityKind;
use tracing::{info, instrument};

use super::registry::NaturalKeyRegistry;
use crate::error::CatalogResult;
use crate::models::validation::{validate_domain, validate_organism, validate_pfam, validate_protein};
use crate::models::{DomainAnnotation, Pfam, PfamRef, ProteinRecord};
use crate::storage::CatalogStore;

/// Check every entity in the record without touching storage
pub fn validate_record(record: &ProteinRecord) -> CatalogResult<()> {
    validate_organism(&record.organism)?;
    validate_protein(&record.protein_attrs())?;
    for domain in &record.domains {
        validate_pfam(&domain.pfam)?;
        validate_domain(&domain.domain_attrs())?;
    }
    Ok(())
}

/// Persist `record` in one transaction and return the stored view
#[instrument(skip(store, record), fields(protein_id = %record.protein_id, domains = record.domains.len()))]
pub async fn upsert_protein(
    store: &dyn CatalogStore,
    record: &ProteinRecord,
) -> CatalogResult<ProteinRecord> {
    validate_record(record)?;

    let mut tx = store.begin().await?;

    let organism = tx.get_or_create_organism(&record.organism).await?;
    let protein = tx.create_protein(&record.protein_attrs(), organism.id).await?;

    let mut pfam_keys: NaturalKeyRegistry<String, PfamRef> = NaturalKeyRegistry::new(EntityKind::Pfam);
    let mut pfams: HashMap<PfamRef, Pfam> = HashMap::new();
    let mut annotations = Vec::with_capacity(record.domains.len());

    for entry in &record.domains {
        let pfam = match pfam_keys.get(entry.pfam.domain_id.as_str()) {
            Some(id) => id,
            None => {
                let pfam = tx.get_or_create_pfam(&entry.pfam).await?;
                let id = pfam.id;
                pfam_keys.record(entry.pfam.domain_id.clone(), id);
                pfams.insert(id, pfam);
                id
            },
        };

        let domain = tx.create_domain(&entry.domain_attrs(), pfam).await?;
        tx.link(protein.id, domain.id).await?;

        if let Some(pfam) = pfams.get(&pfam) {
            annotations.push(DomainAnnotation {
                domain,
                pfam: pfam.clone(),
            });
        }
    }

    tx.commit().await?;

    info!(
        protein = %protein.id,
        organism = %organism.id,
        pfams = pfam_keys.len(),
        "Upserted protein"
    );
    Ok(ProteinRecord::from_parts(&protein, &organism, &annotations))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DomainRecord, OrganismAttrs, PfamAttrs};
    use crate::storage::MemoryStore;

    fn record(protein_id: &str) -> ProteinRecord {
        ProteinRecord {
            protein_id: protein_id.to_string(),
            sequence: "MVIGLSTLLA".to_string(),
            length: 100,
            organism: OrganismAttrs {
                taxa_id: 53326,
                clade: "E".to_string(),
                genus: "Ancylostoma".to_string(),
                species: "ceylanicum".to_string(),
            },
            domains: vec![
                DomainRecord {
                    pfam: PfamAttrs {
                        domain_id: "PF01650".to_string(),
                        domain_description: "PeptidaseC13family".to_string(),
                    },
                    description: "Peptidase C13 legumain".to_string(),
                    start: 10,
                    stop: 30,
                },
                DomainRecord {
                    pfam: PfamAttrs {
                        domain_id: "PF01650".to_string(),
                        domain_description: "PeptidaseC13family".to_string(),
                    },
                    description: "Peptidase C13 legumain".to_string(),
                    start: 50,
                    stop: 70,
                },
            ],
        }
    }

    #[tokio::test]
    async fn test_upsert_returns_view_and_dedups_pfams() {
        let store = MemoryStore::new();
        let view = upsert_protein(&store, &record("A0A016S8J7")).await.unwrap();

        assert_eq!(view, record("A0A016S8J7"));
        assert_eq!(store.count(EntityKind::Pfam).await.unwrap(), 1);
        assert_eq!(store.count(EntityKind::Domain).await.unwrap(), 2);
        assert_eq!(store.count(EntityKind::ProteinDomain).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_invalid_record_touches_nothing() {
        let store = MemoryStore::new();
        let mut bad = record("A0A016S8J7");
        bad.domains[1].start = 90;

        assert!(upsert_protein(&store, &bad).await.is_err());
        for kind in EntityKind::INSERT_ORDER {
            assert_eq!(store.count(kind).await.unwrap(), 0);
        }
    }
}
