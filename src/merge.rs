//! Person merge: consolidate a duplicate person into a canonical one.
//!
//! Imports match people by ORCID or normalized name, but the same
//! researcher still ends up duplicated — name variants, missing ORCID on
//! one source, a typo. The merge rewrites every relationship of the
//! duplicate (`source`) onto the canonical record (`target`) in a single
//! transaction and deletes the duplicate.

use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Contribution, Person};
use crate::utils::{name_similarity, person_key};

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("cannot merge a person into itself")]
    SelfMerge,
    #[error("person not found: {0}")]
    NotFound(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Row counts of what the merge rewrote, returned to the caller.
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct MergeSummary {
    pub author_orders_moved: u64,
    pub author_orders_dropped: u64,
    pub publications_resequenced: u64,
    pub corresponding_rewritten: u64,
    pub dissertations_rewritten: u64,
    pub copromoter_rows_rewritten: u64,
}

/// Merge `source` into `target` and delete `source`.
///
/// - Author-order rows move to `target`. Where both people sit on the same
///   publication, the row with the smaller position survives and a
///   non-`normal` contribution label wins over `normal`.
/// - Every touched publication is re-sequenced to dense positions 0..n-1.
/// - Corresponding-author and dissertation references (author, promoter,
///   supervisor, co-promoters) are rewritten, collapsing duplicates.
/// - Empty contact fields on `target` are filled from `source`.
pub async fn merge_people(
    pool: &SqlitePool,
    target: Uuid,
    source: Uuid,
) -> Result<MergeSummary, MergeError> {
    if target == source {
        return Err(MergeError::SelfMerge);
    }

    let mut tx = pool.begin().await?;
    let target_person = load_person(&mut tx, target).await?;
    let source_person = load_person(&mut tx, source).await?;

    let mut summary = MergeSummary::default();
    let now = Utc::now();

    // Author orders: move, or collapse when target already authors the
    // same publication.
    let source_rows: Vec<(Uuid, Uuid, i64, Contribution)> = sqlx::query_as(
        "SELECT id, publication_id, position, contribution
         FROM author_orders WHERE person_id = ?",
    )
    .bind(source)
    .fetch_all(&mut *tx)
    .await?;

    let mut touched_publications: Vec<Uuid> = Vec::new();

    for (row_id, publication_id, position, contribution) in source_rows {
        touched_publications.push(publication_id);

        let target_row: Option<(Uuid, i64, Contribution)> = sqlx::query_as(
            "SELECT id, position, contribution
             FROM author_orders WHERE publication_id = ? AND person_id = ?",
        )
        .bind(publication_id)
        .bind(target)
        .fetch_optional(&mut *tx)
        .await?;

        match target_row {
            None => {
                sqlx::query(
                    "UPDATE author_orders SET person_id = ?, updated_at = ? WHERE id = ?",
                )
                .bind(target)
                .bind(now)
                .bind(row_id)
                .execute(&mut *tx)
                .await?;
                summary.author_orders_moved += 1;
            }
            Some((surviving_id, target_position, target_contribution)) => {
                let position = position.min(target_position);
                let contribution = if target_contribution == Contribution::Normal
                    && contribution != Contribution::Normal
                {
                    contribution
                } else {
                    target_contribution
                };
                sqlx::query(
                    "UPDATE author_orders
                     SET position = ?, contribution = ?, updated_at = ?
                     WHERE id = ?",
                )
                .bind(position)
                .bind(contribution)
                .bind(now)
                .bind(surviving_id)
                .execute(&mut *tx)
                .await?;
                sqlx::query("DELETE FROM author_orders WHERE id = ?")
                    .bind(row_id)
                    .execute(&mut *tx)
                    .await?;
                summary.author_orders_dropped += 1;
            }
        }
    }

    // Dense re-sequencing of every publication whose author list changed.
    touched_publications.sort();
    touched_publications.dedup();
    for publication_id in &touched_publications {
        let ordered: Vec<Uuid> = sqlx::query_scalar(
            "SELECT id FROM author_orders
             WHERE publication_id = ? ORDER BY position, created_at",
        )
        .bind(publication_id)
        .fetch_all(&mut *tx)
        .await?;
        for (index, row_id) in ordered.iter().enumerate() {
            sqlx::query("UPDATE author_orders SET position = ? WHERE id = ?")
                .bind(index as i64)
                .bind(row_id)
                .execute(&mut *tx)
                .await?;
        }
        summary.publications_resequenced += 1;
    }

    summary.corresponding_rewritten = sqlx::query(
        "UPDATE publications SET corresponding_author_id = ?, updated_at = ?
         WHERE corresponding_author_id = ?",
    )
    .bind(target)
    .bind(now)
    .bind(source)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    for column in ["author_id", "promoter_id", "supervisor_id"] {
        let rewritten = sqlx::query(&format!(
            "UPDATE dissertations SET {column} = ?, updated_at = ? WHERE {column} = ?"
        ))
        .bind(target)
        .bind(now)
        .bind(source)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        summary.dissertations_rewritten += rewritten;
    }

    // Co-promoter rows: point at target, collapsing pairs that would
    // duplicate an existing (dissertation, person) entry.
    summary.copromoter_rows_rewritten = sqlx::query(
        "INSERT OR IGNORE INTO dissertation_copromoters (dissertation_id, person_id)
         SELECT dissertation_id, ? FROM dissertation_copromoters WHERE person_id = ?",
    )
    .bind(target)
    .bind(source)
    .execute(&mut *tx)
    .await?
    .rows_affected();
    sqlx::query("DELETE FROM dissertation_copromoters WHERE person_id = ?")
        .bind(source)
        .execute(&mut *tx)
        .await?;

    // Keep target's data; only fill gaps from the duplicate.
    let email = filled(&target_person.email).or(filled(&source_person.email));
    let orcid = filled(&target_person.orcid).or(filled(&source_person.orcid));
    let affiliation = filled(&target_person.affiliation).or(filled(&source_person.affiliation));
    sqlx::query(
        "UPDATE people SET email = ?, orcid = ?, affiliation = ?, updated_at = ? WHERE id = ?",
    )
    .bind(email)
    .bind(orcid)
    .bind(affiliation)
    .bind(now)
    .bind(target)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM people WHERE id = ?")
        .bind(source)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    info!(
        source = %source_person.display_name(),
        target = %target_person.display_name(),
        moved = summary.author_orders_moved,
        dropped = summary.author_orders_dropped,
        "merged people"
    );
    Ok(summary)
}

/// A candidate pair of duplicate people, highest similarity first.
#[derive(Debug, Serialize, ToSchema)]
pub struct DuplicateCandidate {
    pub person_a: Uuid,
    pub name_a: String,
    pub person_b: Uuid,
    pub name_b: String,
    pub similarity: f64,
}

/// Similarity threshold for listing a pair as likely duplicates.
const DUPLICATE_THRESHOLD: f64 = 0.9;

/// Scan all people for likely duplicates: identical normalized name keys
/// score 1.0, otherwise pairs above [`DUPLICATE_THRESHOLD`] by
/// [`name_similarity`] are listed.
pub async fn find_duplicate_candidates(
    pool: &SqlitePool,
) -> Result<Vec<DuplicateCandidate>, sqlx::Error> {
    let people: Vec<Person> = sqlx::query_as(
        "SELECT id, first_name, last_name, email, orcid, affiliation, created_at, updated_at
         FROM people ORDER BY last_name, first_name",
    )
    .fetch_all(pool)
    .await?;

    let mut candidates = Vec::new();
    for (i, a) in people.iter().enumerate() {
        for b in &people[i + 1..] {
            let similarity = if person_key(&a.first_name, &a.last_name)
                == person_key(&b.first_name, &b.last_name)
            {
                1.0
            } else {
                name_similarity(&a.display_name(), &b.display_name())
            };
            if similarity >= DUPLICATE_THRESHOLD {
                candidates.push(DuplicateCandidate {
                    person_a: a.id,
                    name_a: a.display_name(),
                    person_b: b.id,
                    name_b: b.display_name(),
                    similarity,
                });
            }
        }
    }
    candidates.sort_by(|x, y| {
        y.similarity
            .partial_cmp(&x.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    Ok(candidates)
}

async fn load_person(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    id: Uuid,
) -> Result<Person, MergeError> {
    sqlx::query_as::<_, Person>(
        "SELECT id, first_name, last_name, email, orcid, affiliation, created_at, updated_at
         FROM people WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(MergeError::NotFound(id))
}

fn filled(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
