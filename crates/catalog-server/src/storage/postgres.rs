//! PostgreSQL catalog store
//!
//! Bulk inserts carry the surrogate ids assigned by the graph builder. After
//! each such batch the table's serial sequence is moved past the highest id
//! so that later single-row inserts keep drawing fresh values.

use async_trait::async_trait;
use catalog_common::EntityKind;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use tracing::debug;

use super::{CatalogStore, CatalogTransaction, EntityRows, Page, StoreError, StoreResult};
use crate::models::{
    Domain, DomainAnnotation, DomainAttrs, DomainRef, Organism, OrganismAttrs, OrganismRef, Pfam,
    PfamAttrs, PfamRef, Protein, ProteinAttrs, ProteinRef,
};

const ORGANISM_COLUMNS: &str = "id, taxa_id, clade, genus, species";
const PFAM_COLUMNS: &str = "id, domain_id, domain_description";
const PROTEIN_COLUMNS: &str = "id, protein_id, sequence, length, organism_ref";
const DOMAIN_COLUMNS: &str = "id, pfam_ref, description, start_pos, stop_pos";

fn table(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Organism => "organisms",
        EntityKind::Pfam => "pfams",
        EntityKind::Protein => "proteins",
        EntityKind::Domain => "domains",
        EntityKind::ProteinDomain => "protein_domains",
    }
}

/// Translate constraint violations into store errors
fn write_error(err: sqlx::Error, kind: EntityKind, key: impl FnOnce() -> String) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            return StoreError::Duplicate { kind, key: key() };
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::MissingReference {
                kind,
                detail: db_err.message().to_string(),
            };
        }
    }
    StoreError::Database(err)
}

/// Row shape of the domain/pfam join
#[derive(sqlx::FromRow)]
struct AnnotationRow {
    id: DomainRef,
    pfam_ref: PfamRef,
    description: String,
    start_pos: i64,
    stop_pos: i64,
    domain_id: String,
    domain_description: String,
}

impl From<AnnotationRow> for DomainAnnotation {
    fn from(row: AnnotationRow) -> Self {
        DomainAnnotation {
            domain: Domain {
                id: row.id,
                pfam: row.pfam_ref,
                description: row.description,
                start: row.start_pos,
                stop: row.stop_pos,
            },
            pfam: Pfam {
                id: row.pfam_ref,
                domain_id: row.domain_id,
                domain_description: row.domain_description,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn begin(&self) -> StoreResult<Box<dyn CatalogTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgCatalogTransaction { tx }))
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn count(&self, kind: EntityKind) -> StoreResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table(kind));
        Ok(sqlx::query_scalar(&sql).fetch_one(&self.pool).await?)
    }

    async fn organism(&self, taxa_id: i64) -> StoreResult<Option<Organism>> {
        let sql = format!("SELECT {ORGANISM_COLUMNS} FROM organisms WHERE taxa_id = $1");
        Ok(sqlx::query_as::<_, Organism>(&sql)
            .bind(taxa_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn organism_by_ref(&self, id: OrganismRef) -> StoreResult<Option<Organism>> {
        let sql = format!("SELECT {ORGANISM_COLUMNS} FROM organisms WHERE id = $1");
        Ok(sqlx::query_as::<_, Organism>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn pfam(&self, domain_id: &str) -> StoreResult<Option<Pfam>> {
        let sql = format!("SELECT {PFAM_COLUMNS} FROM pfams WHERE domain_id = $1");
        Ok(sqlx::query_as::<_, Pfam>(&sql)
            .bind(domain_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn protein(&self, protein_id: &str) -> StoreResult<Option<Protein>> {
        let sql = format!("SELECT {PROTEIN_COLUMNS} FROM proteins WHERE protein_id = $1");
        Ok(sqlx::query_as::<_, Protein>(&sql)
            .bind(protein_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn protein_domains(&self, protein: ProteinRef) -> StoreResult<Vec<DomainAnnotation>> {
        let rows = sqlx::query_as::<_, AnnotationRow>(
            r#"
            SELECT d.id, d.pfam_ref, d.description, d.start_pos, d.stop_pos,
                   p.domain_id, p.domain_description
            FROM protein_domains pd
            JOIN domains d ON d.id = pd.domain_ref
            JOIN pfams p ON p.id = d.pfam_ref
            WHERE pd.protein_ref = $1
            ORDER BY d.id
            "#,
        )
        .bind(protein)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(DomainAnnotation::from).collect())
    }

    async fn list_organisms(&self, page: Page) -> StoreResult<Vec<Organism>> {
        let sql =
            format!("SELECT {ORGANISM_COLUMNS} FROM organisms ORDER BY id LIMIT $1 OFFSET $2");
        Ok(sqlx::query_as::<_, Organism>(&sql)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn list_pfams(&self, page: Page) -> StoreResult<Vec<Pfam>> {
        let sql = format!("SELECT {PFAM_COLUMNS} FROM pfams ORDER BY id LIMIT $1 OFFSET $2");
        Ok(sqlx::query_as::<_, Pfam>(&sql)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn list_proteins(&self, page: Page) -> StoreResult<Vec<Protein>> {
        let sql = format!("SELECT {PROTEIN_COLUMNS} FROM proteins ORDER BY id LIMIT $1 OFFSET $2");
        Ok(sqlx::query_as::<_, Protein>(&sql)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn list_domains(&self, page: Page) -> StoreResult<Vec<Domain>> {
        let sql = format!("SELECT {DOMAIN_COLUMNS} FROM domains ORDER BY id LIMIT $1 OFFSET $2");
        Ok(sqlx::query_as::<_, Domain>(&sql)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn organism_proteins(&self, organism: OrganismRef) -> StoreResult<Vec<Protein>> {
        let sql =
            format!("SELECT {PROTEIN_COLUMNS} FROM proteins WHERE organism_ref = $1 ORDER BY id");
        Ok(sqlx::query_as::<_, Protein>(&sql)
            .bind(organism)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn organism_pfams(&self, organism: OrganismRef) -> StoreResult<Vec<Pfam>> {
        Ok(sqlx::query_as::<_, Pfam>(
            r#"
            SELECT DISTINCT p.id, p.domain_id, p.domain_description
            FROM proteins pr
            JOIN protein_domains pd ON pd.protein_ref = pr.id
            JOIN domains d ON d.id = pd.domain_ref
            JOIN pfams p ON p.id = d.pfam_ref
            WHERE pr.organism_ref = $1
            ORDER BY p.id
            "#,
        )
        .bind(organism)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn pfam_domains(&self, pfam: PfamRef) -> StoreResult<Vec<Domain>> {
        let sql = format!("SELECT {DOMAIN_COLUMNS} FROM domains WHERE pfam_ref = $1 ORDER BY id");
        Ok(sqlx::query_as::<_, Domain>(&sql)
            .bind(pfam)
            .fetch_all(&self.pool)
            .await?)
    }
}

pub struct PgCatalogTransaction {
    tx: Transaction<'static, Postgres>,
}

impl PgCatalogTransaction {
    /// Move the serial sequence past ids inserted explicitly
    async fn resync_sequence(&mut self, kind: EntityKind) -> StoreResult<()> {
        let table = table(kind);
        let sql = format!(
            "SELECT setval(pg_get_serial_sequence('{table}', 'id'), \
             COALESCE((SELECT MAX(id) FROM {table}), 0) + 1, false)"
        );
        sqlx::query(&sql).execute(&mut *self.tx).await?;
        Ok(())
    }
}

#[async_trait]
impl CatalogTransaction for PgCatalogTransaction {
    async fn delete_all(&mut self, kind: EntityKind) -> StoreResult<u64> {
        let sql = format!("DELETE FROM {}", table(kind));
        let result = sqlx::query(&sql)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| write_error(e, kind, String::new))?;
        Ok(result.rows_affected())
    }

    async fn count(&mut self, kind: EntityKind) -> StoreResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table(kind));
        Ok(sqlx::query_scalar(&sql).fetch_one(&mut *self.tx).await?)
    }

    async fn bulk_insert(&mut self, rows: EntityRows<'_>) -> StoreResult<u64> {
        if rows.is_empty() {
            return Ok(0);
        }

        let kind = rows.kind();
        let mut builder: QueryBuilder<'_, Postgres> = match rows {
            EntityRows::Organisms(batch) => {
                let mut b = QueryBuilder::new(format!("INSERT INTO organisms ({ORGANISM_COLUMNS}) "));
                b.push_values(batch, |mut b, row| {
                    b.push_bind(row.id)
                        .push_bind(row.taxa_id)
                        .push_bind(&row.clade)
                        .push_bind(&row.genus)
                        .push_bind(&row.species);
                });
                b
            },
            EntityRows::Pfams(batch) => {
                let mut b = QueryBuilder::new(format!("INSERT INTO pfams ({PFAM_COLUMNS}) "));
                b.push_values(batch, |mut b, row| {
                    b.push_bind(row.id)
                        .push_bind(&row.domain_id)
                        .push_bind(&row.domain_description);
                });
                b
            },
            EntityRows::Proteins(batch) => {
                let mut b = QueryBuilder::new(format!("INSERT INTO proteins ({PROTEIN_COLUMNS}) "));
                b.push_values(batch, |mut b, row| {
                    b.push_bind(row.id)
                        .push_bind(&row.protein_id)
                        .push_bind(&row.sequence)
                        .push_bind(row.length)
                        .push_bind(row.organism);
                });
                b
            },
            EntityRows::Domains(batch) => {
                let mut b = QueryBuilder::new(format!("INSERT INTO domains ({DOMAIN_COLUMNS}) "));
                b.push_values(batch, |mut b, row| {
                    b.push_bind(row.id)
                        .push_bind(row.pfam)
                        .push_bind(&row.description)
                        .push_bind(row.start)
                        .push_bind(row.stop);
                });
                b
            },
            EntityRows::Links(batch) => {
                let mut b =
                    QueryBuilder::new("INSERT INTO protein_domains (protein_ref, domain_ref) ");
                b.push_values(batch, |mut b, row| {
                    b.push_bind(row.protein).push_bind(row.domain);
                });
                b
            },
        };

        let result = builder
            .build()
            .execute(&mut *self.tx)
            .await
            .map_err(|e| write_error(e, kind, || format!("batch of {}", rows.len())))?;

        if kind != EntityKind::ProteinDomain {
            self.resync_sequence(kind).await?;
        }

        debug!(kind = %kind, rows = result.rows_affected(), "Inserted batch");
        Ok(result.rows_affected())
    }

    async fn get_or_create_organism(&mut self, attrs: &OrganismAttrs) -> StoreResult<Organism> {
        // The no-op update makes RETURNING yield the existing row on conflict
        let sql = format!(
            "INSERT INTO organisms (taxa_id, clade, genus, species) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (taxa_id) DO UPDATE SET taxa_id = EXCLUDED.taxa_id \
             RETURNING {ORGANISM_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Organism>(&sql)
            .bind(attrs.taxa_id)
            .bind(&attrs.clade)
            .bind(&attrs.genus)
            .bind(&attrs.species)
            .fetch_one(&mut *self.tx)
            .await?)
    }

    async fn get_or_create_pfam(&mut self, attrs: &PfamAttrs) -> StoreResult<Pfam> {
        let sql = format!(
            "INSERT INTO pfams (domain_id, domain_description) VALUES ($1, $2) \
             ON CONFLICT (domain_id) DO UPDATE SET domain_id = EXCLUDED.domain_id \
             RETURNING {PFAM_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Pfam>(&sql)
            .bind(&attrs.domain_id)
            .bind(&attrs.domain_description)
            .fetch_one(&mut *self.tx)
            .await?)
    }

    async fn create_protein(
        &mut self,
        attrs: &ProteinAttrs,
        organism: OrganismRef,
    ) -> StoreResult<Protein> {
        let sql = format!(
            "INSERT INTO proteins (protein_id, sequence, length, organism_ref) \
             VALUES ($1, $2, $3, $4) RETURNING {PROTEIN_COLUMNS}"
        );
        sqlx::query_as::<_, Protein>(&sql)
            .bind(&attrs.protein_id)
            .bind(&attrs.sequence)
            .bind(attrs.length)
            .bind(organism)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| write_error(e, EntityKind::Protein, || attrs.protein_id.clone()))
    }

    async fn create_domain(&mut self, attrs: &DomainAttrs, pfam: PfamRef) -> StoreResult<Domain> {
        let sql = format!(
            "INSERT INTO domains (pfam_ref, description, start_pos, stop_pos) \
             VALUES ($1, $2, $3, $4) RETURNING {DOMAIN_COLUMNS}"
        );
        sqlx::query_as::<_, Domain>(&sql)
            .bind(pfam)
            .bind(&attrs.description)
            .bind(attrs.start)
            .bind(attrs.stop)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| write_error(e, EntityKind::Domain, || format!("pfam {pfam}")))
    }

    async fn link(&mut self, protein: ProteinRef, domain: DomainRef) -> StoreResult<()> {
        sqlx::query("INSERT INTO protein_domains (protein_ref, domain_ref) VALUES ($1, $2)")
            .bind(protein)
            .bind(domain)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| {
                write_error(e, EntityKind::ProteinDomain, || format!("{protein}/{domain}"))
            })?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
