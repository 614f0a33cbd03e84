//! External metadata ingestion.
//!
//! Each source module (`crossref`, `orcid`, `pubmed`) turns that API's JSON
//! into a [`WorkRecord`], the common normalized shape. Everything downstream
//! of parsing — de-duplication, person reconciliation, author ordering — is
//! shared and lives here.
//!
//! Parsing is best-effort by design: a malformed record is skipped with a
//! warning, never an error that aborts the batch.

pub mod crossref;
pub mod orcid;
pub mod pubmed;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::Contribution;
use crate::utils::{normalize_name, normalize_orcid};

/// One author of a work, as reported by a source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkAuthor {
    pub first_name: String,
    pub last_name: String,
    pub affiliation: Option<String>,
    pub orcid: Option<String>,
    /// Source flagged this author as corresponding.
    pub corresponding: bool,
}

/// A publication in source-independent form, ready to upsert.
#[derive(Debug, Clone, Default)]
pub struct WorkRecord {
    pub doi: Option<String>,
    pub pmid: Option<String>,
    pub title: String,
    pub abstract_text: Option<String>,
    pub journal: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub pages: Option<String>,
    pub url: Option<String>,
    pub publication_year: Option<i64>,
    pub publication_date: Option<NaiveDate>,
    pub notes: Option<String>,
    /// Authors in source order.
    pub authors: Vec<WorkAuthor>,
}

/// What happened to a single record during import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    /// Inserted as a new publication.
    Added(Uuid),
    /// A publication with the same DOI already exists.
    DuplicateDoi(String),
    /// No DOI, but a publication with the same title already exists.
    DuplicateTitle(String),
}

/// Running totals for a batch import, for the end-of-run summary line.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImportStats {
    pub added: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ImportStats {
    pub fn record(&mut self, outcome: &ImportOutcome) {
        match outcome {
            ImportOutcome::Added(_) => self.added += 1,
            _ => self.skipped += 1,
        }
    }
}

/// Insert a [`WorkRecord`] with its authors, unless it is a duplicate.
///
/// Duplicate check: normalized DOI first, exact title when the record has
/// no DOI. Authors are attached in source order; position 0 is marked
/// `first`, the final position `last`, and a source-flagged corresponding
/// author gets `corresponding` and becomes the publication's corresponding
/// author. The whole upsert runs in one transaction.
pub async fn import_work(pool: &SqlitePool, record: &WorkRecord) -> Result<ImportOutcome> {
    if let Some(existing) = find_existing(pool, record).await? {
        return Ok(existing);
    }

    let mut tx = pool.begin().await.context("failed to begin transaction")?;
    let now = Utc::now();
    let publication_id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO publications (
            id, title, abstract_text, journal, volume, issue, pages,
            publication_date, publication_year, doi, pmid, url, notes,
            citation_count, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
        "#,
    )
    .bind(publication_id)
    .bind(&record.title)
    .bind(&record.abstract_text)
    .bind(&record.journal)
    .bind(&record.volume)
    .bind(&record.issue)
    .bind(&record.pages)
    .bind(record.publication_date)
    .bind(record.publication_year)
    .bind(&record.doi)
    .bind(&record.pmid)
    .bind(&record.url)
    .bind(&record.notes)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .context("failed to insert publication")?;

    let last = record.authors.len().saturating_sub(1);
    let mut corresponding_id: Option<Uuid> = None;

    for (position, author) in record.authors.iter().enumerate() {
        if author.last_name.is_empty() {
            warn!(publication = %record.title, "skipping author without family name");
            continue;
        }
        let person_id = get_or_create_person_tx(&mut tx, author).await?;

        let mut contribution = Contribution::Normal;
        if position == 0 {
            contribution = Contribution::First;
        } else if position == last {
            contribution = Contribution::Last;
        }
        if author.corresponding {
            contribution = Contribution::Corresponding;
            corresponding_id = Some(person_id);
        }

        sqlx::query(
            r#"
            INSERT OR IGNORE INTO author_orders (
                id, publication_id, person_id, position, contribution,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(publication_id)
        .bind(person_id)
        .bind(position as i64)
        .bind(contribution)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .context("failed to insert author order")?;
    }

    if let Some(person_id) = corresponding_id {
        sqlx::query("UPDATE publications SET corresponding_author_id = ? WHERE id = ?")
            .bind(person_id)
            .bind(publication_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await.context("failed to commit import")?;
    info!(title = %record.title, "added publication");
    Ok(ImportOutcome::Added(publication_id))
}

/// Whether a record would be skipped as a duplicate. Lets callers avoid
/// detail fetches (ORCID) or report skips before a dry run.
pub async fn work_exists(pool: &SqlitePool, record: &WorkRecord) -> Result<bool> {
    Ok(find_existing(pool, record).await?.is_some())
}

/// Duplicate lookup used before every insert.
async fn find_existing(pool: &SqlitePool, record: &WorkRecord) -> Result<Option<ImportOutcome>> {
    if let Some(doi) = &record.doi {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM publications WHERE doi = ?)")
                .bind(doi)
                .fetch_one(pool)
                .await?;
        if exists {
            return Ok(Some(ImportOutcome::DuplicateDoi(doi.clone())));
        }
        return Ok(None);
    }

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM publications WHERE title = ?)")
            .bind(&record.title)
            .fetch_one(pool)
            .await?;
    if exists {
        return Ok(Some(ImportOutcome::DuplicateTitle(record.title.clone())));
    }
    Ok(None)
}

/// Find or insert the person a source author refers to.
///
/// Matching order: ORCID when the author carries one, then
/// case/accent-insensitive `(last_name, first_name)`. A match with no
/// affiliation on file picks up the source's affiliation; other fields are
/// never overwritten from import.
pub async fn get_or_create_person(pool: &SqlitePool, author: &WorkAuthor) -> Result<Uuid> {
    let mut tx = pool.begin().await?;
    let id = get_or_create_person_tx(&mut tx, author).await?;
    tx.commit().await?;
    Ok(id)
}

async fn get_or_create_person_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    author: &WorkAuthor,
) -> Result<Uuid> {
    let orcid = author.orcid.as_deref().and_then(normalize_orcid);

    if let Some(orcid) = &orcid {
        let found: Option<Uuid> = sqlx::query_scalar("SELECT id FROM people WHERE orcid = ?")
            .bind(orcid)
            .fetch_optional(&mut **tx)
            .await?;
        if let Some(id) = found {
            backfill_affiliation(tx, id, author.affiliation.as_deref()).await?;
            return Ok(id);
        }
    }

    // Accent-insensitive name match: SQLite LOWER() only folds ASCII, so
    // candidates come back by ASCII-lowered name and are compared folded.
    let candidates: Vec<(Uuid, String, String)> = sqlx::query_as(
        "SELECT id, first_name, last_name FROM people WHERE LOWER(last_name) = LOWER(?)",
    )
    .bind(&author.last_name)
    .fetch_all(&mut **tx)
    .await?;

    for (id, first, last) in &candidates {
        if normalize_name(first) == normalize_name(&author.first_name)
            && normalize_name(last) == normalize_name(&author.last_name)
        {
            if let Some(orcid) = &orcid {
                sqlx::query("UPDATE people SET orcid = ?, updated_at = ? WHERE id = ? AND (orcid IS NULL OR orcid = '')")
                    .bind(orcid)
                    .bind(Utc::now())
                    .bind(id)
                    .execute(&mut **tx)
                    .await?;
            }
            backfill_affiliation(tx, *id, author.affiliation.as_deref()).await?;
            return Ok(*id);
        }
    }

    let id = Uuid::new_v4();
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO people (id, first_name, last_name, orcid, affiliation, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(&author.first_name)
    .bind(&author.last_name)
    .bind(&orcid)
    .bind(&author.affiliation)
    .bind(now)
    .bind(now)
    .execute(&mut **tx)
    .await
    .context("failed to insert person")?;
    info!(first = %author.first_name, last = %author.last_name, "created person");
    Ok(id)
}

async fn backfill_affiliation(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    person_id: Uuid,
    affiliation: Option<&str>,
) -> Result<()> {
    if let Some(affiliation) = affiliation {
        sqlx::query(
            "UPDATE people SET affiliation = ?, updated_at = ?
             WHERE id = ? AND (affiliation IS NULL OR affiliation = '')",
        )
        .bind(affiliation)
        .bind(Utc::now())
        .bind(person_id)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}
