use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use sqlx::{QueryBuilder, SqlitePool};
use utoipa::IntoParams;
use uuid::Uuid;

use crate::models::{CreateDissertation, Degree, Dissertation, Person, UpdateDissertation};

const DISSERTATION_COLUMNS: &str = "id, title, author_id, promoter_id, supervisor_id, degree, \
     start_date, defense_date, abstract_text, institution, department, url, keywords, notes, \
     created_at, updated_at";

#[derive(Debug, Deserialize, IntoParams)]
pub struct DissertationQuery {
    /// Search term matched against the title
    pub search: Option<String>,
    /// Filter by degree
    pub degree: Option<Degree>,
    /// Filter by person in any role (author, promoter, supervisor, co-promoter)
    pub person: Option<Uuid>,
    /// Maximum number of results (default: 100)
    pub limit: Option<i64>,
    /// Number of results to skip (default: 0)
    pub offset: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/dissertations",
    tag = "dissertations",
    params(DissertationQuery),
    responses(
        (status = 200, description = "List of dissertations", body = Vec<Dissertation>),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_dissertations(
    State(pool): State<SqlitePool>,
    Query(query): Query<DissertationQuery>,
) -> Result<Json<Vec<Dissertation>>, StatusCode> {
    let mut builder = QueryBuilder::new(format!(
        "SELECT {DISSERTATION_COLUMNS} FROM dissertations WHERE 1 = 1"
    ));

    if let Some(search) = &query.search {
        builder.push(" AND title LIKE ");
        builder.push_bind(format!("%{}%", search));
    }
    if let Some(degree) = query.degree {
        builder.push(" AND degree = ");
        builder.push_bind(degree.as_str());
    }
    if let Some(person) = query.person {
        builder.push(" AND (author_id = ");
        builder.push_bind(person);
        builder.push(" OR promoter_id = ");
        builder.push_bind(person);
        builder.push(" OR supervisor_id = ");
        builder.push_bind(person);
        builder.push(
            " OR id IN (SELECT dissertation_id FROM dissertation_copromoters WHERE person_id = ",
        );
        builder.push_bind(person);
        builder.push("))");
    }

    builder.push(" ORDER BY defense_date DESC, title LIMIT ");
    builder.push_bind(query.limit.unwrap_or(100));
    builder.push(" OFFSET ");
    builder.push_bind(query.offset.unwrap_or(0));

    let dissertations = builder
        .build_query_as::<Dissertation>()
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch dissertations: {:?}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(dissertations))
}

#[utoipa::path(
    get,
    path = "/api/dissertations/{id}",
    tag = "dissertations",
    params(("id" = Uuid, Path, description = "Dissertation ID")),
    responses(
        (status = 200, description = "Dissertation found", body = Dissertation),
        (status = 404, description = "Dissertation not found")
    )
)]
pub async fn get_dissertation(
    State(pool): State<SqlitePool>,
    Path(id): Path<Uuid>,
) -> Result<Json<Dissertation>, StatusCode> {
    sqlx::query_as::<_, Dissertation>(&format!(
        "SELECT {DISSERTATION_COLUMNS} FROM dissertations WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
    .map(Json)
    .ok_or(StatusCode::NOT_FOUND)
}

#[utoipa::path(
    get,
    path = "/api/dissertations/{id}/copromoters",
    tag = "dissertations",
    params(("id" = Uuid, Path, description = "Dissertation ID")),
    responses(
        (status = 200, description = "Co-promoters", body = Vec<Person>),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_copromoters(
    State(pool): State<SqlitePool>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Person>>, StatusCode> {
    sqlx::query_as::<_, Person>(
        "SELECT p.id, p.first_name, p.last_name, p.email, p.orcid, p.affiliation,
                p.created_at, p.updated_at
         FROM dissertation_copromoters dc
         JOIN people p ON p.id = dc.person_id
         WHERE dc.dissertation_id = ?
         ORDER BY p.last_name, p.first_name",
    )
    .bind(id)
    .fetch_all(&pool)
    .await
    .map(Json)
    .map_err(|e| {
        tracing::error!("Failed to fetch co-promoters: {:?}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

#[utoipa::path(
    post,
    path = "/api/dissertations",
    tag = "dissertations",
    request_body = CreateDissertation,
    responses(
        (status = 201, description = "Dissertation created", body = Dissertation),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_dissertation(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateDissertation>,
) -> Result<(StatusCode, Json<Dissertation>), StatusCode> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let now = Utc::now();
    let dissertation = sqlx::query_as::<_, Dissertation>(&format!(
        "INSERT INTO dissertations (
            id, title, author_id, promoter_id, supervisor_id, degree, start_date,
            defense_date, abstract_text, institution, department, url, keywords, notes,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {DISSERTATION_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(&payload.title)
    .bind(payload.author_id)
    .bind(payload.promoter_id)
    .bind(payload.supervisor_id)
    .bind(payload.degree.unwrap_or(Degree::PhD))
    .bind(payload.start_date)
    .bind(payload.defense_date)
    .bind(&payload.abstract_text)
    .bind(&payload.institution)
    .bind(&payload.department)
    .bind(&payload.url)
    .bind(&payload.keywords)
    .bind(&payload.notes)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create dissertation: {:?}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    for person_id in payload.copromoter_ids.unwrap_or_default() {
        sqlx::query(
            "INSERT OR IGNORE INTO dissertation_copromoters (dissertation_id, person_id)
             VALUES (?, ?)",
        )
        .bind(dissertation.id)
        .bind(person_id)
        .execute(&mut *tx)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    }

    tx.commit()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok((StatusCode::CREATED, Json(dissertation)))
}

#[utoipa::path(
    put,
    path = "/api/dissertations/{id}",
    tag = "dissertations",
    params(("id" = Uuid, Path, description = "Dissertation ID")),
    request_body = UpdateDissertation,
    responses(
        (status = 200, description = "Dissertation updated", body = Dissertation),
        (status = 404, description = "Dissertation not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn update_dissertation(
    State(pool): State<SqlitePool>,
    Path(id): Path<Uuid>,
    Json(update): Json<UpdateDissertation>,
) -> Result<Json<Dissertation>, StatusCode> {
    let existing = sqlx::query_as::<_, Dissertation>(&format!(
        "SELECT {DISSERTATION_COLUMNS} FROM dissertations WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
    .ok_or(StatusCode::NOT_FOUND)?;

    let mut tx = pool
        .begin()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let dissertation = sqlx::query_as::<_, Dissertation>(&format!(
        "UPDATE dissertations SET
            title = ?, author_id = ?, promoter_id = ?, supervisor_id = ?, degree = ?,
            start_date = ?, defense_date = ?, abstract_text = ?, institution = ?,
            department = ?, url = ?, keywords = ?, notes = ?, updated_at = ?
         WHERE id = ?
         RETURNING {DISSERTATION_COLUMNS}"
    ))
    .bind(update.title.unwrap_or(existing.title))
    .bind(update.author_id.unwrap_or(existing.author_id))
    .bind(update.promoter_id.unwrap_or(existing.promoter_id))
    .bind(update.supervisor_id.or(existing.supervisor_id))
    .bind(update.degree.unwrap_or(existing.degree))
    .bind(update.start_date.or(existing.start_date))
    .bind(update.defense_date.or(existing.defense_date))
    .bind(update.abstract_text.or(existing.abstract_text))
    .bind(update.institution.or(existing.institution))
    .bind(update.department.or(existing.department))
    .bind(update.url.or(existing.url))
    .bind(update.keywords.or(existing.keywords))
    .bind(update.notes.or(existing.notes))
    .bind(Utc::now())
    .bind(id)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to update dissertation: {:?}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    if let Some(copromoter_ids) = update.copromoter_ids {
        sqlx::query("DELETE FROM dissertation_copromoters WHERE dissertation_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        for person_id in copromoter_ids {
            sqlx::query(
                "INSERT OR IGNORE INTO dissertation_copromoters (dissertation_id, person_id)
                 VALUES (?, ?)",
            )
            .bind(id)
            .bind(person_id)
            .execute(&mut *tx)
            .await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        }
    }

    tx.commit()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(dissertation))
}

#[utoipa::path(
    delete,
    path = "/api/dissertations/{id}",
    tag = "dissertations",
    params(("id" = Uuid, Path, description = "Dissertation ID")),
    responses(
        (status = 204, description = "Dissertation deleted"),
        (status = 404, description = "Dissertation not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn delete_dissertation(
    State(pool): State<SqlitePool>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    let result = sqlx::query("DELETE FROM dissertations WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if result.rows_affected() == 0 {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(StatusCode::NO_CONTENT)
}
