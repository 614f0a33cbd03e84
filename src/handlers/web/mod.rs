pub mod home;
pub mod publications;
pub mod dissertations;

pub use home::*;
pub use publications::*;
pub use dissertations::*;

use sqlx::SqlitePool;
use uuid::Uuid;

/// Author display names for a publication, in author order.
pub(crate) async fn ordered_author_names(
    pool: &SqlitePool,
    publication_id: Uuid,
) -> Result<Vec<String>, sqlx::Error> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT p.first_name, p.last_name
         FROM author_orders ao
         JOIN people p ON p.id = ao.person_id
         WHERE ao.publication_id = ?
         ORDER BY ao.position",
    )
    .bind(publication_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(first, last)| {
            if first.is_empty() {
                last
            } else {
                format!("{first} {last}")
            }
        })
        .collect())
}
