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

use crate::models::{AuthorOrder, Contribution, CreateAuthorOrder, UpdateAuthorOrder};

const AUTHOR_ORDER_COLUMNS: &str =
    "id, publication_id, person_id, position, contribution, created_at, updated_at";

#[derive(Debug, Deserialize, IntoParams)]
pub struct AuthorOrderQuery {
    /// Filter by publication ID
    pub publication_id: Option<Uuid>,
    /// Filter by person ID
    pub person_id: Option<Uuid>,
}

#[utoipa::path(
    get,
    path = "/api/author-orders",
    tag = "author-orders",
    params(AuthorOrderQuery),
    responses(
        (status = 200, description = "List of author order entries", body = Vec<AuthorOrder>),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_author_orders(
    State(pool): State<SqlitePool>,
    Query(query): Query<AuthorOrderQuery>,
) -> Result<Json<Vec<AuthorOrder>>, StatusCode> {
    let entries = match (query.publication_id, query.person_id) {
        (Some(publication_id), Some(person_id)) => {
            sqlx::query_as::<_, AuthorOrder>(&format!(
                "SELECT {AUTHOR_ORDER_COLUMNS} FROM author_orders
                 WHERE publication_id = ? AND person_id = ? ORDER BY position"
            ))
            .bind(publication_id)
            .bind(person_id)
            .fetch_all(&pool)
            .await
        }
        (Some(publication_id), None) => {
            sqlx::query_as::<_, AuthorOrder>(&format!(
                "SELECT {AUTHOR_ORDER_COLUMNS} FROM author_orders
                 WHERE publication_id = ? ORDER BY position"
            ))
            .bind(publication_id)
            .fetch_all(&pool)
            .await
        }
        (None, Some(person_id)) => {
            sqlx::query_as::<_, AuthorOrder>(&format!(
                "SELECT {AUTHOR_ORDER_COLUMNS} FROM author_orders
                 WHERE person_id = ? ORDER BY created_at DESC"
            ))
            .bind(person_id)
            .fetch_all(&pool)
            .await
        }
        (None, None) => {
            sqlx::query_as::<_, AuthorOrder>(&format!(
                "SELECT {AUTHOR_ORDER_COLUMNS} FROM author_orders
                 ORDER BY created_at DESC LIMIT 100"
            ))
            .fetch_all(&pool)
            .await
        }
    };

    entries.map(Json).map_err(|e| {
        tracing::error!("Failed to fetch author orders: {:?}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

#[utoipa::path(
    get,
    path = "/api/author-orders/{id}",
    tag = "author-orders",
    params(("id" = Uuid, Path, description = "Author order ID")),
    responses(
        (status = 200, description = "Author order found", body = AuthorOrder),
        (status = 404, description = "Author order not found")
    )
)]
pub async fn get_author_order(
    State(pool): State<SqlitePool>,
    Path(id): Path<Uuid>,
) -> Result<Json<AuthorOrder>, StatusCode> {
    sqlx::query_as::<_, AuthorOrder>(&format!(
        "SELECT {AUTHOR_ORDER_COLUMNS} FROM author_orders WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
    .map(Json)
    .ok_or(StatusCode::NOT_FOUND)
}

#[utoipa::path(
    post,
    path = "/api/author-orders",
    tag = "author-orders",
    request_body = CreateAuthorOrder,
    responses(
        (status = 201, description = "Author order created", body = AuthorOrder),
        (status = 409, description = "Person already listed on this publication"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_author_order(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateAuthorOrder>,
) -> Result<(StatusCode, Json<AuthorOrder>), StatusCode> {
    let now = Utc::now();
    let entry = sqlx::query_as::<_, AuthorOrder>(&format!(
        "INSERT INTO author_orders (
            id, publication_id, person_id, position, contribution, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING {AUTHOR_ORDER_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(payload.publication_id)
    .bind(payload.person_id)
    .bind(payload.position)
    .bind(payload.contribution.unwrap_or(Contribution::Normal))
    .bind(now)
    .bind(now)
    .fetch_one(&pool)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StatusCode::CONFLICT,
        _ => {
            tracing::error!("Failed to create author order: {:?}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    })?;

    Ok((StatusCode::CREATED, Json(entry)))
}

#[utoipa::path(
    put,
    path = "/api/author-orders/{id}",
    tag = "author-orders",
    params(("id" = Uuid, Path, description = "Author order ID")),
    request_body = UpdateAuthorOrder,
    responses(
        (status = 200, description = "Author order updated", body = AuthorOrder),
        (status = 404, description = "Author order not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn update_author_order(
    State(pool): State<SqlitePool>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAuthorOrder>,
) -> Result<Json<AuthorOrder>, StatusCode> {
    let existing = sqlx::query_as::<_, AuthorOrder>(&format!(
        "SELECT {AUTHOR_ORDER_COLUMNS} FROM author_orders WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
    .ok_or(StatusCode::NOT_FOUND)?;

    let entry = sqlx::query_as::<_, AuthorOrder>(&format!(
        "UPDATE author_orders SET position = ?, contribution = ?, updated_at = ?
         WHERE id = ?
         RETURNING {AUTHOR_ORDER_COLUMNS}"
    ))
    .bind(payload.position.unwrap_or(existing.position))
    .bind(payload.contribution.unwrap_or(existing.contribution))
    .bind(Utc::now())
    .bind(id)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to update author order: {:?}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(entry))
}

#[utoipa::path(
    delete,
    path = "/api/author-orders/{id}",
    tag = "author-orders",
    params(("id" = Uuid, Path, description = "Author order ID")),
    responses(
        (status = 204, description = "Author order deleted"),
        (status = 404, description = "Author order not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn delete_author_order(
    State(pool): State<SqlitePool>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    let result = sqlx::query("DELETE FROM author_orders WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if result.rows_affected() == 0 {
        Err(StatusCode::NOT_FOUND)
    } else {
        Ok(StatusCode::NO_CONTENT)
    }
}
