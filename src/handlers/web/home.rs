use askama::Template;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use sqlx::SqlitePool;

use crate::models::Publication;

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate {
    total_publications: i64,
    total_people: i64,
    recent: Vec<RecentPublication>,
}

struct RecentPublication {
    id: String,
    title: String,
    year: String,
    journal: String,
    authors: String,
}

pub async fn home(State(pool): State<SqlitePool>) -> Result<Response, StatusCode> {
    let total_publications: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM publications")
        .fetch_one(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Database error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let total_people: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM people")
        .fetch_one(&pool)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let recent_rows = sqlx::query_as::<_, Publication>(
        "SELECT id, title, abstract_text, journal, conference, volume, issue, pages,
                publication_date, publication_year, doi, pmid, arxiv_id, isbn, url, keywords,
                research_field, citation_count, impact_factor, notes, corresponding_author_id,
                created_at, updated_at
         FROM publications
         ORDER BY publication_year DESC, created_at DESC
         LIMIT 5",
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Database error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let mut recent = Vec::with_capacity(recent_rows.len());
    for publication in recent_rows {
        let authors = super::ordered_author_names(&pool, publication.id)
            .await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .join(", ");
        recent.push(RecentPublication {
            id: publication.id.to_string(),
            title: publication.title,
            year: publication
                .publication_year
                .map(|y| y.to_string())
                .unwrap_or_default(),
            journal: publication.journal.unwrap_or_default(),
            authors,
        });
    }

    let template = HomeTemplate {
        total_publications,
        total_people,
        recent,
    };
    match template.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            tracing::error!("Template error: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
