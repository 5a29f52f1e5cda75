//! In-memory catalog store
//!
//! All tables sit behind one async mutex. A transaction holds the lock for
//! its whole life and works on a copy of the tables, which replaces the
//! shared state on commit. Writers are therefore fully serialized, and
//! readers wait for an open transaction to finish.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use catalog_common::EntityKind;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use super::{CatalogStore, CatalogTransaction, EntityRows, Page, StoreError, StoreResult};
use crate::models::{
    Domain, DomainAnnotation, DomainAttrs, DomainRef, Organism, OrganismAttrs, OrganismRef, Pfam,
    PfamAttrs, PfamRef, Protein, ProteinAttrs, ProteinDomain, ProteinRef,
};

#[derive(Debug, Clone, Default)]
struct Tables {
    organisms: BTreeMap<OrganismRef, Organism>,
    organism_keys: HashMap<i64, OrganismRef>,
    pfams: BTreeMap<PfamRef, Pfam>,
    pfam_keys: HashMap<String, PfamRef>,
    proteins: BTreeMap<ProteinRef, Protein>,
    protein_keys: HashMap<String, ProteinRef>,
    domains: BTreeMap<DomainRef, Domain>,
    links: BTreeSet<(ProteinRef, DomainRef)>,
}

fn duplicate(kind: EntityKind, key: impl ToString) -> StoreError {
    StoreError::Duplicate {
        kind,
        key: key.to_string(),
    }
}

fn missing(kind: EntityKind, detail: String) -> StoreError {
    StoreError::MissingReference { kind, detail }
}

impl Tables {
    fn count(&self, kind: EntityKind) -> i64 {
        let n = match kind {
            EntityKind::Organism => self.organisms.len(),
            EntityKind::Pfam => self.pfams.len(),
            EntityKind::Protein => self.proteins.len(),
            EntityKind::Domain => self.domains.len(),
            EntityKind::ProteinDomain => self.links.len(),
        };
        n as i64
    }

    /// Deletes are refused while another table still points at the rows
    fn delete_all(&mut self, kind: EntityKind) -> StoreResult<u64> {
        let blocked_by = match kind {
            EntityKind::Organism if !self.proteins.is_empty() => Some(EntityKind::Protein),
            EntityKind::Pfam if !self.domains.is_empty() => Some(EntityKind::Domain),
            EntityKind::Protein | EntityKind::Domain if !self.links.is_empty() => {
                Some(EntityKind::ProteinDomain)
            },
            _ => None,
        };
        if let Some(referrer) = blocked_by {
            return Err(missing(
                referrer,
                format!("{kind} rows are still referenced"),
            ));
        }

        let removed = self.count(kind) as u64;
        match kind {
            EntityKind::Organism => {
                self.organisms.clear();
                self.organism_keys.clear();
            },
            EntityKind::Pfam => {
                self.pfams.clear();
                self.pfam_keys.clear();
            },
            EntityKind::Protein => {
                self.proteins.clear();
                self.protein_keys.clear();
            },
            EntityKind::Domain => self.domains.clear(),
            EntityKind::ProteinDomain => self.links.clear(),
        }
        Ok(removed)
    }

    fn insert_organism(&mut self, organism: Organism) -> StoreResult<()> {
        if self.organism_keys.contains_key(&organism.taxa_id) {
            return Err(duplicate(EntityKind::Organism, organism.taxa_id));
        }
        if self.organisms.contains_key(&organism.id) {
            return Err(duplicate(EntityKind::Organism, format!("id {}", organism.id)));
        }
        self.organism_keys.insert(organism.taxa_id, organism.id);
        self.organisms.insert(organism.id, organism);
        Ok(())
    }

    fn insert_pfam(&mut self, pfam: Pfam) -> StoreResult<()> {
        if self.pfam_keys.contains_key(&pfam.domain_id) {
            return Err(duplicate(EntityKind::Pfam, &pfam.domain_id));
        }
        if self.pfams.contains_key(&pfam.id) {
            return Err(duplicate(EntityKind::Pfam, format!("id {}", pfam.id)));
        }
        self.pfam_keys.insert(pfam.domain_id.clone(), pfam.id);
        self.pfams.insert(pfam.id, pfam);
        Ok(())
    }

    fn insert_protein(&mut self, protein: Protein) -> StoreResult<()> {
        if !self.organisms.contains_key(&protein.organism) {
            return Err(missing(
                EntityKind::Protein,
                format!("organism {} does not exist", protein.organism),
            ));
        }
        if self.protein_keys.contains_key(&protein.protein_id) {
            return Err(duplicate(EntityKind::Protein, &protein.protein_id));
        }
        if self.proteins.contains_key(&protein.id) {
            return Err(duplicate(EntityKind::Protein, format!("id {}", protein.id)));
        }
        self.protein_keys.insert(protein.protein_id.clone(), protein.id);
        self.proteins.insert(protein.id, protein);
        Ok(())
    }

    fn insert_domain(&mut self, domain: Domain) -> StoreResult<()> {
        if !self.pfams.contains_key(&domain.pfam) {
            return Err(missing(
                EntityKind::Domain,
                format!("pfam {} does not exist", domain.pfam),
            ));
        }
        if self.domains.contains_key(&domain.id) {
            return Err(duplicate(EntityKind::Domain, format!("id {}", domain.id)));
        }
        self.domains.insert(domain.id, domain);
        Ok(())
    }

    fn insert_link(&mut self, link: ProteinDomain) -> StoreResult<()> {
        if !self.proteins.contains_key(&link.protein) {
            return Err(missing(
                EntityKind::ProteinDomain,
                format!("protein {} does not exist", link.protein),
            ));
        }
        if !self.domains.contains_key(&link.domain) {
            return Err(missing(
                EntityKind::ProteinDomain,
                format!("domain {} does not exist", link.domain),
            ));
        }
        if !self.links.insert((link.protein, link.domain)) {
            return Err(duplicate(
                EntityKind::ProteinDomain,
                format!("{}/{}", link.protein, link.domain),
            ));
        }
        Ok(())
    }

    fn next_organism_ref(&self) -> OrganismRef {
        OrganismRef(self.organisms.keys().next_back().map_or(1, |id| id.get() + 1))
    }

    fn next_pfam_ref(&self) -> PfamRef {
        PfamRef(self.pfams.keys().next_back().map_or(1, |id| id.get() + 1))
    }

    fn next_protein_ref(&self) -> ProteinRef {
        ProteinRef(self.proteins.keys().next_back().map_or(1, |id| id.get() + 1))
    }

    fn next_domain_ref(&self) -> DomainRef {
        DomainRef(self.domains.keys().next_back().map_or(1, |id| id.get() + 1))
    }

    fn protein_domains(&self, protein: ProteinRef) -> Vec<DomainAnnotation> {
        self.links
            .iter()
            .filter(|(p, _)| *p == protein)
            .filter_map(|(_, d)| {
                let domain = self.domains.get(d)?;
                let pfam = self.pfams.get(&domain.pfam)?;
                Some(DomainAnnotation {
                    domain: domain.clone(),
                    pfam: pfam.clone(),
                })
            })
            .collect()
    }
}

fn page_of<'a, T: Clone + 'a>(rows: impl Iterator<Item = &'a T>, page: Page) -> Vec<T> {
    let (offset, limit) = page.bounds();
    rows.skip(offset).take(limit).cloned().collect()
}

/// Process-local store, cheap to clone
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn CatalogTransaction>> {
        let guard = self.tables.clone().lock_owned().await;
        let working = Tables::clone(&guard);
        Ok(Box::new(MemoryTransaction { guard, working }))
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn count(&self, kind: EntityKind) -> StoreResult<i64> {
        Ok(self.tables.lock().await.count(kind))
    }

    async fn organism(&self, taxa_id: i64) -> StoreResult<Option<Organism>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .organism_keys
            .get(&taxa_id)
            .and_then(|id| tables.organisms.get(id))
            .cloned())
    }

    async fn organism_by_ref(&self, id: OrganismRef) -> StoreResult<Option<Organism>> {
        Ok(self.tables.lock().await.organisms.get(&id).cloned())
    }

    async fn pfam(&self, domain_id: &str) -> StoreResult<Option<Pfam>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .pfam_keys
            .get(domain_id)
            .and_then(|id| tables.pfams.get(id))
            .cloned())
    }

    async fn protein(&self, protein_id: &str) -> StoreResult<Option<Protein>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .protein_keys
            .get(protein_id)
            .and_then(|id| tables.proteins.get(id))
            .cloned())
    }

    async fn protein_domains(&self, protein: ProteinRef) -> StoreResult<Vec<DomainAnnotation>> {
        Ok(self.tables.lock().await.protein_domains(protein))
    }

    async fn list_organisms(&self, page: Page) -> StoreResult<Vec<Organism>> {
        Ok(page_of(self.tables.lock().await.organisms.values(), page))
    }

    async fn list_pfams(&self, page: Page) -> StoreResult<Vec<Pfam>> {
        Ok(page_of(self.tables.lock().await.pfams.values(), page))
    }

    async fn list_proteins(&self, page: Page) -> StoreResult<Vec<Protein>> {
        Ok(page_of(self.tables.lock().await.proteins.values(), page))
    }

    async fn list_domains(&self, page: Page) -> StoreResult<Vec<Domain>> {
        Ok(page_of(self.tables.lock().await.domains.values(), page))
    }

    async fn organism_proteins(&self, organism: OrganismRef) -> StoreResult<Vec<Protein>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .proteins
            .values()
            .filter(|p| p.organism == organism)
            .cloned()
            .collect())
    }

    async fn organism_pfams(&self, organism: OrganismRef) -> StoreResult<Vec<Pfam>> {
        let tables = self.tables.lock().await;
        let pfam_refs: BTreeSet<PfamRef> = tables
            .links
            .iter()
            .filter(|(p, _)| {
                tables
                    .proteins
                    .get(p)
                    .is_some_and(|protein| protein.organism == organism)
            })
            .filter_map(|(_, d)| tables.domains.get(d).map(|domain| domain.pfam))
            .collect();

        Ok(pfam_refs
            .iter()
            .filter_map(|id| tables.pfams.get(id).cloned())
            .collect())
    }

    async fn pfam_domains(&self, pfam: PfamRef) -> StoreResult<Vec<Domain>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .domains
            .values()
            .filter(|d| d.pfam == pfam)
            .cloned()
            .collect())
    }
}

/// Exclusive writer over a working copy of the tables
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

#[async_trait]
impl CatalogTransaction for MemoryTransaction {
    async fn delete_all(&mut self, kind: EntityKind) -> StoreResult<u64> {
        self.working.delete_all(kind)
    }

    async fn count(&mut self, kind: EntityKind) -> StoreResult<i64> {
        Ok(self.working.count(kind))
    }

    async fn bulk_insert(&mut self, rows: EntityRows<'_>) -> StoreResult<u64> {
        let tables = &mut self.working;
        match rows {
            EntityRows::Organisms(rows) => {
                for row in rows {
                    tables.insert_organism(row.clone())?;
                }
            },
            EntityRows::Pfams(rows) => {
                for row in rows {
                    tables.insert_pfam(row.clone())?;
                }
            },
            EntityRows::Proteins(rows) => {
                for row in rows {
                    tables.insert_protein(row.clone())?;
                }
            },
            EntityRows::Domains(rows) => {
                for row in rows {
                    tables.insert_domain(row.clone())?;
                }
            },
            EntityRows::Links(rows) => {
                for row in rows {
                    tables.insert_link(*row)?;
                }
            },
        }
        debug!(kind = %rows.kind(), rows = rows.len(), "Inserted batch");
        Ok(rows.len() as u64)
    }

    async fn get_or_create_organism(&mut self, attrs: &OrganismAttrs) -> StoreResult<Organism> {
        let tables = &mut self.working;
        if let Some(existing) = tables
            .organism_keys
            .get(&attrs.taxa_id)
            .and_then(|id| tables.organisms.get(id))
        {
            return Ok(existing.clone());
        }

        let organism = Organism::new(tables.next_organism_ref(), attrs.clone());
        tables.insert_organism(organism.clone())?;
        Ok(organism)
    }

    async fn get_or_create_pfam(&mut self, attrs: &PfamAttrs) -> StoreResult<Pfam> {
        let tables = &mut self.working;
        if let Some(existing) = tables
            .pfam_keys
            .get(&attrs.domain_id)
            .and_then(|id| tables.pfams.get(id))
        {
            return Ok(existing.clone());
        }

        let pfam = Pfam::new(tables.next_pfam_ref(), attrs.clone());
        tables.insert_pfam(pfam.clone())?;
        Ok(pfam)
    }

    async fn create_protein(
        &mut self,
        attrs: &ProteinAttrs,
        organism: OrganismRef,
    ) -> StoreResult<Protein> {
        let tables = &mut self.working;
        let protein = Protein::new(tables.next_protein_ref(), attrs.clone(), organism);
        tables.insert_protein(protein.clone())?;
        Ok(protein)
    }

    async fn create_domain(&mut self, attrs: &DomainAttrs, pfam: PfamRef) -> StoreResult<Domain> {
        let tables = &mut self.working;
        let domain = Domain::new(tables.next_domain_ref(), attrs.clone(), pfam);
        tables.insert_domain(domain.clone())?;
        Ok(domain)
    }

    async fn link(&mut self, protein: ProteinRef, domain: DomainRef) -> StoreResult<()> {
        self.working.insert_link(ProteinDomain { protein, domain })
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryTransaction { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
