use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::merge::{self, DuplicateCandidate, MergeError, MergeSummary};
use crate::models::{CreatePerson, MergeRequest, Person, UpdatePerson};
use crate::utils::normalize_orcid;

const PERSON_COLUMNS: &str =
    "id, first_name, last_name, email, orcid, affiliation, created_at, updated_at";

#[derive(Debug, Deserialize, IntoParams)]
pub struct PersonQuery {
    /// Search term matched against names, email, ORCID, and affiliation
    pub search: Option<String>,
    /// Maximum number of results (default: 100)
    pub limit: Option<i64>,
    /// Number of results to skip (default: 0)
    pub offset: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/people",
    tag = "people",
    params(PersonQuery),
    responses(
        (status = 200, description = "List of people", body = Vec<Person>),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_people(
    State(pool): State<SqlitePool>,
    Query(query): Query<PersonQuery>,
) -> Result<Json<Vec<Person>>, StatusCode> {
    let limit = query.limit.unwrap_or(100);
    let offset = query.offset.unwrap_or(0);

    let people = if let Some(search) = &query.search {
        let pattern = format!("%{}%", search);
        sqlx::query_as::<_, Person>(&format!(
            "SELECT {PERSON_COLUMNS} FROM people
             WHERE first_name LIKE ?1 OR last_name LIKE ?1 OR email LIKE ?1
                OR orcid LIKE ?1 OR affiliation LIKE ?1
             ORDER BY last_name, first_name
             LIMIT ?2 OFFSET ?3"
        ))
        .bind(pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&pool)
        .await
    } else {
        sqlx::query_as::<_, Person>(&format!(
            "SELECT {PERSON_COLUMNS} FROM people
             ORDER BY last_name, first_name
             LIMIT ?1 OFFSET ?2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&pool)
        .await
    }
    .map_err(|e| {
        tracing::error!("Failed to fetch people: {:?}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(people))
}

#[utoipa::path(
    get,
    path = "/api/people/{id}",
    tag = "people",
    params(("id" = Uuid, Path, description = "Person ID")),
    responses(
        (status = 200, description = "Person found", body = Person),
        (status = 404, description = "Person not found")
    )
)]
pub async fn get_person(
    State(pool): State<SqlitePool>,
    Path(id): Path<Uuid>,
) -> Result<Json<Person>, StatusCode> {
    sqlx::query_as::<_, Person>(&format!("SELECT {PERSON_COLUMNS} FROM people WHERE id = ?"))
        .bind(id)
        .fetch_optional(&pool)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

#[utoipa::path(
    post,
    path = "/api/people",
    tag = "people",
    request_body = CreatePerson,
    responses(
        (status = 201, description = "Person created", body = Person),
        (status = 400, description = "Invalid ORCID iD"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_person(
    State(pool): State<SqlitePool>,
    Json(new_person): Json<CreatePerson>,
) -> Result<(StatusCode, Json<Person>), StatusCode> {
    let orcid = match &new_person.orcid {
        Some(raw) if !raw.trim().is_empty() => {
            Some(normalize_orcid(raw).ok_or(StatusCode::BAD_REQUEST)?)
        }
        _ => None,
    };

    let id = Uuid::new_v4();
    let now = Utc::now();
    let person = sqlx::query_as::<_, Person>(&format!(
        "INSERT INTO people (id, first_name, last_name, email, orcid, affiliation, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)
         RETURNING {PERSON_COLUMNS}"
    ))
    .bind(id)
    .bind(&new_person.first_name)
    .bind(&new_person.last_name)
    .bind(&new_person.email)
    .bind(&orcid)
    .bind(&new_person.affiliation)
    .bind(now)
    .bind(now)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create person: {:?}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok((StatusCode::CREATED, Json(person)))
}

#[utoipa::path(
    put,
    path = "/api/people/{id}",
    tag = "people",
    params(("id" = Uuid, Path, description = "Person ID")),
    request_body = UpdatePerson,
    responses(
        (status = 200, description = "Person updated", body = Person),
        (status = 400, description = "Invalid ORCID iD"),
        (status = 404, description = "Person not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn update_person(
    State(pool): State<SqlitePool>,
    Path(id): Path<Uuid>,
    Json(update): Json<UpdatePerson>,
) -> Result<Json<Person>, StatusCode> {
    let existing = sqlx::query_as::<_, Person>(&format!(
        "SELECT {PERSON_COLUMNS} FROM people WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
    .ok_or(StatusCode::NOT_FOUND)?;

    let orcid = match update.orcid {
        Some(raw) if !raw.trim().is_empty() => {
            Some(normalize_orcid(&raw).ok_or(StatusCode::BAD_REQUEST)?)
        }
        Some(_) => None,
        None => existing.orcid,
    };

    let person = sqlx::query_as::<_, Person>(&format!(
        "UPDATE people
         SET first_name = ?, last_name = ?, email = ?, orcid = ?, affiliation = ?, updated_at = ?
         WHERE id = ?
         RETURNING {PERSON_COLUMNS}"
    ))
    .bind(update.first_name.unwrap_or(existing.first_name))
    .bind(update.last_name.unwrap_or(existing.last_name))
    .bind(update.email.or(existing.email))
    .bind(orcid)
    .bind(update.affiliation.or(existing.affiliation))
    .bind(Utc::now())
    .bind(id)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to update person: {:?}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(person))
}

#[utoipa::path(
    delete,
    path = "/api/people/{id}",
    tag = "people",
    params(("id" = Uuid, Path, description = "Person ID")),
    responses(
        (status = 204, description = "Person deleted"),
        (status = 404, description = "Person not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn delete_person(
    State(pool): State<SqlitePool>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    let result = sqlx::query("DELETE FROM people WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if result.rows_affected() == 0 {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/people/{id}/merge",
    tag = "people",
    params(("id" = Uuid, Path, description = "Target (surviving) person ID")),
    request_body = MergeRequest,
    responses(
        (status = 200, description = "Merge completed", body = MergeSummary),
        (status = 400, description = "Source and target are the same person"),
        (status = 404, description = "Person not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn merge_person(
    State(pool): State<SqlitePool>,
    Path(id): Path<Uuid>,
    Json(request): Json<MergeRequest>,
) -> Result<Json<MergeSummary>, StatusCode> {
    merge::merge_people(&pool, id, request.source_id)
        .await
        .map(Json)
        .map_err(|e| match e {
            MergeError::SelfMerge => StatusCode::BAD_REQUEST,
            MergeError::NotFound(_) => StatusCode::NOT_FOUND,
            MergeError::Database(err) => {
                tracing::error!("Merge failed: {:?}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        })
}

#[utoipa::path(
    get,
    path = "/api/people/duplicates",
    tag = "people",
    responses(
        (status = 200, description = "Likely duplicate pairs", body = Vec<DuplicateCandidate>),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_duplicates(
    State(pool): State<SqlitePool>,
) -> Result<Json<Vec<DuplicateCandidate>>, StatusCode> {
    merge::find_duplicate_candidates(&pool)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!("Failed to scan for duplicates: {:?}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
}
