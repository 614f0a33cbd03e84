use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, SqlitePool};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::models::{Contribution, CreatePublication, Publication, UpdatePublication};
use crate::utils::normalize_doi;

const PUBLICATION_COLUMNS: &str = "id, title, abstract_text, journal, conference, volume, issue, \
     pages, publication_date, publication_year, doi, pmid, arxiv_id, isbn, url, keywords, \
     research_field, citation_count, impact_factor, notes, corresponding_author_id, \
     created_at, updated_at";

#[derive(Debug, Deserialize, IntoParams)]
pub struct PublicationQuery {
    /// Search term matched against the title
    pub search: Option<String>,
    /// Filter by publication year
    pub year: Option<i64>,
    /// Filter by author (person ID)
    pub author: Option<Uuid>,
    /// Maximum number of results (default: 100)
    pub limit: Option<i64>,
    /// Number of results to skip (default: 0)
    pub offset: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/publications",
    tag = "publications",
    params(PublicationQuery),
    responses(
        (status = 200, description = "List of publications", body = Vec<Publication>),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_publications(
    State(pool): State<SqlitePool>,
    Query(query): Query<PublicationQuery>,
) -> Result<Json<Vec<Publication>>, StatusCode> {
    let mut builder = QueryBuilder::new(format!(
        "SELECT {PUBLICATION_COLUMNS} FROM publications WHERE 1 = 1"
    ));

    if let Some(search) = &query.search {
        builder.push(" AND title LIKE ");
        builder.push_bind(format!("%{}%", search));
    }
    if let Some(year) = query.year {
        builder.push(" AND publication_year = ");
        builder.push_bind(year);
    }
    if let Some(author) = query.author {
        builder.push(" AND id IN (SELECT publication_id FROM author_orders WHERE person_id = ");
        builder.push_bind(author);
        builder.push(")");
    }

    builder.push(" ORDER BY publication_year DESC, title LIMIT ");
    builder.push_bind(query.limit.unwrap_or(100));
    builder.push(" OFFSET ");
    builder.push_bind(query.offset.unwrap_or(0));

    let publications = builder
        .build_query_as::<Publication>()
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch publications: {:?}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(publications))
}

#[utoipa::path(
    get,
    path = "/api/publications/{id}",
    tag = "publications",
    params(("id" = Uuid, Path, description = "Publication ID")),
    responses(
        (status = 200, description = "Publication found", body = Publication),
        (status = 404, description = "Publication not found")
    )
)]
pub async fn get_publication(
    State(pool): State<SqlitePool>,
    Path(id): Path<Uuid>,
) -> Result<Json<Publication>, StatusCode> {
    sqlx::query_as::<_, Publication>(&format!(
        "SELECT {PUBLICATION_COLUMNS} FROM publications WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
    .map(Json)
    .ok_or(StatusCode::NOT_FOUND)
}

/// One author of a publication, joined with person data, in author order.
#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct PublicationAuthor {
    pub person_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub position: i64,
    pub contribution: Contribution,
}

#[utoipa::path(
    get,
    path = "/api/publications/{id}/authors",
    tag = "publications",
    params(("id" = Uuid, Path, description = "Publication ID")),
    responses(
        (status = 200, description = "Authors in order", body = Vec<PublicationAuthor>),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_publication_authors(
    State(pool): State<SqlitePool>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<PublicationAuthor>>, StatusCode> {
    sqlx::query_as::<_, PublicationAuthor>(
        "SELECT p.id AS person_id, p.first_name, p.last_name, ao.position, ao.contribution
         FROM author_orders ao
         JOIN people p ON p.id = ao.person_id
         WHERE ao.publication_id = ?
         ORDER BY ao.position",
    )
    .bind(id)
    .fetch_all(&pool)
    .await
    .map(Json)
    .map_err(|e| {
        tracing::error!("Failed to fetch publication authors: {:?}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

#[utoipa::path(
    post,
    path = "/api/publications",
    tag = "publications",
    request_body = CreatePublication,
    responses(
        (status = 201, description = "Publication created", body = Publication),
        (status = 400, description = "Invalid DOI"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_publication(
    State(pool): State<SqlitePool>,
    Json(new_publication): Json<CreatePublication>,
) -> Result<(StatusCode, Json<Publication>), StatusCode> {
    let doi = match &new_publication.doi {
        Some(raw) if !raw.trim().is_empty() => {
            Some(normalize_doi(raw).ok_or(StatusCode::BAD_REQUEST)?)
        }
        _ => None,
    };

    let now = Utc::now();
    let publication = sqlx::query_as::<_, Publication>(&format!(
        "INSERT INTO publications (
            id, title, abstract_text, journal, conference, volume, issue, pages,
            publication_date, publication_year, doi, pmid, arxiv_id, isbn, url,
            keywords, research_field, citation_count, impact_factor, notes,
            corresponding_author_id, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {PUBLICATION_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(&new_publication.title)
    .bind(&new_publication.abstract_text)
    .bind(&new_publication.journal)
    .bind(&new_publication.conference)
    .bind(&new_publication.volume)
    .bind(&new_publication.issue)
    .bind(&new_publication.pages)
    .bind(new_publication.publication_date)
    .bind(new_publication.publication_year)
    .bind(&doi)
    .bind(&new_publication.pmid)
    .bind(&new_publication.arxiv_id)
    .bind(&new_publication.isbn)
    .bind(&new_publication.url)
    .bind(&new_publication.keywords)
    .bind(&new_publication.research_field)
    .bind(new_publication.citation_count.unwrap_or(0))
    .bind(new_publication.impact_factor)
    .bind(&new_publication.notes)
    .bind(new_publication.corresponding_author_id)
    .bind(now)
    .bind(now)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create publication: {:?}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok((StatusCode::CREATED, Json(publication)))
}

#[utoipa::path(
    put,
    path = "/api/publications/{id}",
    tag = "publications",
    params(("id" = Uuid, Path, description = "Publication ID")),
    request_body = UpdatePublication,
    responses(
        (status = 200, description = "Publication updated", body = Publication),
        (status = 400, description = "Invalid DOI"),
        (status = 404, description = "Publication not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn update_publication(
    State(pool): State<SqlitePool>,
    Path(id): Path<Uuid>,
    Json(update): Json<UpdatePublication>,
) -> Result<Json<Publication>, StatusCode> {
    let existing = sqlx::query_as::<_, Publication>(&format!(
        "SELECT {PUBLICATION_COLUMNS} FROM publications WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
    .ok_or(StatusCode::NOT_FOUND)?;

    let doi = match update.doi {
        Some(raw) if !raw.trim().is_empty() => {
            Some(normalize_doi(&raw).ok_or(StatusCode::BAD_REQUEST)?)
        }
        Some(_) => None,
        None => existing.doi,
    };

    let publication = sqlx::query_as::<_, Publication>(&format!(
        "UPDATE publications SET
            title = ?, abstract_text = ?, journal = ?, conference = ?, volume = ?,
            issue = ?, pages = ?, publication_date = ?, publication_year = ?, doi = ?,
            pmid = ?, arxiv_id = ?, isbn = ?, url = ?, keywords = ?, research_field = ?,
            citation_count = ?, impact_factor = ?, notes = ?, corresponding_author_id = ?,
            updated_at = ?
         WHERE id = ?
         RETURNING {PUBLICATION_COLUMNS}"
    ))
    .bind(update.title.unwrap_or(existing.title))
    .bind(update.abstract_text.or(existing.abstract_text))
    .bind(update.journal.or(existing.journal))
    .bind(update.conference.or(existing.conference))
    .bind(update.volume.or(existing.volume))
    .bind(update.issue.or(existing.issue))
    .bind(update.pages.or(existing.pages))
    .bind(update.publication_date.or(existing.publication_date))
    .bind(update.publication_year.or(existing.publication_year))
    .bind(doi)
    .bind(update.pmid.or(existing.pmid))
    .bind(update.arxiv_id.or(existing.arxiv_id))
    .bind(update.isbn.or(existing.isbn))
    .bind(update.url.or(existing.url))
    .bind(update.keywords.or(existing.keywords))
    .bind(update.research_field.or(existing.research_field))
    .bind(update.citation_count.unwrap_or(existing.citation_count))
    .bind(update.impact_factor.or(existing.impact_factor))
    .bind(update.notes.or(existing.notes))
    .bind(update.corresponding_author_id.or(existing.corresponding_author_id))
    .bind(Utc::now())
    .bind(id)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to update publication: {:?}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(publication))
}

#[utoipa::path(
    delete,
    path = "/api/publications/{id}",
    tag = "publications",
    params(("id" = Uuid, Path, description = "Publication ID")),
    responses(
        (status = 204, description = "Publication deleted"),
        (status = 404, description = "Publication not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn delete_publication(
    State(pool): State<SqlitePool>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    let result = sqlx::query("DELETE FROM publications WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if result.rows_affected() == 0 {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(StatusCode::NO_CONTENT)
}
