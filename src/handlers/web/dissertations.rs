use askama::Template;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde::Deserialize;
use sqlx::{QueryBuilder, SqlitePool};
use uuid::Uuid;

use crate::models::{Dissertation, Person};

#[derive(Template)]
#[template(path = "dissertations_list.html")]
struct DissertationsListTemplate {
    dissertations: Vec<DissertationListItem>,
    current_degree: String,
    current_search: String,
}

struct DissertationListItem {
    id: String,
    title: String,
    degree: String,
    author: String,
    promoter: String,
    defense_date: String,
    institution: String,
}

#[derive(Template)]
#[template(path = "dissertation_detail.html")]
struct DissertationDetailTemplate {
    title: String,
    degree: String,
    author: String,
    promoter: String,
    supervisor: String,
    copromoters: Vec<String>,
    start_date: String,
    defense_date: String,
    abstract_text: String,
    institution: String,
    department: String,
    url: String,
    keywords: Vec<String>,
    notes: String,
}

#[derive(Debug, Deserialize)]
pub struct DissertationListParams {
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub search: String,
}

pub async fn dissertations_list(
    Query(params): Query<DissertationListParams>,
    State(pool): State<SqlitePool>,
) -> Result<Response, StatusCode> {
    let mut builder = QueryBuilder::new(
        "SELECT id, title, author_id, promoter_id, supervisor_id, degree, start_date,
                defense_date, abstract_text, institution, department, url, keywords, notes,
                created_at, updated_at
         FROM dissertations WHERE 1 = 1",
    );
    if !params.degree.is_empty() {
        builder.push(" AND degree = ");
        builder.push_bind(params.degree.clone());
    }
    if !params.search.is_empty() {
        builder.push(" AND title LIKE ");
        builder.push_bind(format!("%{}%", params.search));
    }
    builder.push(" ORDER BY defense_date DESC, title LIMIT 100");

    let rows = builder
        .build_query_as::<Dissertation>()
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Database error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let mut dissertations = Vec::with_capacity(rows.len());
    for dissertation in rows {
        let author = person_name(&pool, Some(dissertation.author_id)).await?;
        let promoter = person_name(&pool, Some(dissertation.promoter_id)).await?;
        dissertations.push(DissertationListItem {
            id: dissertation.id.to_string(),
            title: dissertation.title,
            degree: dissertation.degree.as_str().to_string(),
            author,
            promoter,
            defense_date: dissertation
                .defense_date
                .map(|d| d.to_string())
                .unwrap_or_default(),
            institution: dissertation.institution.unwrap_or_default(),
        });
    }

    let template = DissertationsListTemplate {
        dissertations,
        current_degree: params.degree,
        current_search: params.search,
    };
    match template.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            tracing::error!("Template error: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub async fn dissertation_detail(
    Path(id): Path<String>,
    State(pool): State<SqlitePool>,
) -> Result<Response, StatusCode> {
    let dissertation_id = Uuid::parse_str(&id).map_err(|_| StatusCode::BAD_REQUEST)?;

    let dissertation = sqlx::query_as::<_, Dissertation>(
        "SELECT id, title, author_id, promoter_id, supervisor_id, degree, start_date,
                defense_date, abstract_text, institution, department, url, keywords, notes,
                created_at, updated_at
         FROM dissertations WHERE id = ?",
    )
    .bind(dissertation_id)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Database error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?
    .ok_or(StatusCode::NOT_FOUND)?;

    let author = person_name(&pool, Some(dissertation.author_id)).await?;
    let promoter = person_name(&pool, Some(dissertation.promoter_id)).await?;
    let supervisor = person_name(&pool, dissertation.supervisor_id).await?;

    let copromoters: Vec<String> = sqlx::query_as::<_, Person>(
        "SELECT p.id, p.first_name, p.last_name, p.email, p.orcid, p.affiliation,
                p.created_at, p.updated_at
         FROM dissertation_copromoters dc
         JOIN people p ON p.id = dc.person_id
         WHERE dc.dissertation_id = ?
         ORDER BY p.last_name, p.first_name",
    )
    .bind(dissertation_id)
    .fetch_all(&pool)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
    .into_iter()
    .map(|p| p.display_name())
    .collect();

    let keywords = dissertation.keywords_list();
    let template = DissertationDetailTemplate {
        title: dissertation.title,
        degree: dissertation.degree.as_str().to_string(),
        author,
        promoter,
        supervisor,
        copromoters,
        start_date: dissertation
            .start_date
            .map(|d| d.to_string())
            .unwrap_or_default(),
        defense_date: dissertation
            .defense_date
            .map(|d| d.to_string())
            .unwrap_or_default(),
        abstract_text: dissertation.abstract_text.unwrap_or_default(),
        institution: dissertation.institution.unwrap_or_default(),
        department: dissertation.department.unwrap_or_default(),
        url: dissertation.url.unwrap_or_default(),
        keywords,
        notes: dissertation.notes.unwrap_or_default(),
    };
    match template.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            tracing::error!("Template error: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn person_name(pool: &SqlitePool, id: Option<Uuid>) -> Result<String, StatusCode> {
    let Some(id) = id else {
        return Ok(String::new());
    };
    sqlx::query_as::<_, Person>(
        "SELECT id, first_name, last_name, email, orcid, affiliation, created_at, updated_at
         FROM people WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
    .map(|p| p.map(|p| p.display_name()).unwrap_or_default())
}
