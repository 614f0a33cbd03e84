use askama::Template;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde::Deserialize;
use sqlx::{QueryBuilder, SqlitePool};
use uuid::Uuid;

use crate::models::{Contribution, Person, Publication};

const PAGE_SIZE: i64 = 10;

#[derive(Template)]
#[template(path = "publications_list.html")]
struct PublicationsListTemplate {
    publications: Vec<PublicationListItem>,
    years: Vec<String>,
    people: Vec<FilterPerson>,
    current_year: String,
    current_author: String,
    current_search: String,
    filter_query: String,
    page: i64,
    prev_page: i64,
    next_page: i64,
    has_prev: bool,
    has_next: bool,
}

struct PublicationListItem {
    id: String,
    title: String,
    authors: String,
    journal: String,
    year: String,
    doi: String,
}

struct FilterPerson {
    id: String,
    name: String,
}

#[derive(Template)]
#[template(path = "publication_detail.html")]
struct PublicationDetailTemplate {
    title: String,
    abstract_text: String,
    journal: String,
    conference: String,
    volume: String,
    issue: String,
    pages: String,
    year: String,
    publication_date: String,
    doi: String,
    pmid: String,
    arxiv_id: String,
    isbn: String,
    url: String,
    research_field: String,
    citation_count: i64,
    notes: String,
    keywords: Vec<String>,
    authors: Vec<DetailAuthor>,
    corresponding: String,
}

struct DetailAuthor {
    person_id: String,
    name: String,
    contribution: String,
}

#[derive(Debug, Deserialize)]
pub struct PublicationListParams {
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub search: String,
    pub page: Option<i64>,
}

pub async fn publications_list(
    Query(params): Query<PublicationListParams>,
    State(pool): State<SqlitePool>,
) -> Result<Response, StatusCode> {
    let year = params.year.parse::<i64>().ok();
    let author = Uuid::parse_str(&params.author).ok();
    let page = params.page.unwrap_or(1).max(1);

    let mut builder = QueryBuilder::new(
        "SELECT id, title, abstract_text, journal, conference, volume, issue, pages,
                publication_date, publication_year, doi, pmid, arxiv_id, isbn, url, keywords,
                research_field, citation_count, impact_factor, notes, corresponding_author_id,
                created_at, updated_at
         FROM publications WHERE 1 = 1",
    );
    if let Some(year) = year {
        builder.push(" AND publication_year = ");
        builder.push_bind(year);
    }
    if let Some(author) = author {
        builder.push(" AND id IN (SELECT publication_id FROM author_orders WHERE person_id = ");
        builder.push_bind(author);
        builder.push(")");
    }
    if !params.search.is_empty() {
        builder.push(" AND title LIKE ");
        builder.push_bind(format!("%{}%", params.search));
    }
    // One extra row tells us whether a next page exists.
    builder.push(" ORDER BY publication_year DESC, title LIMIT ");
    builder.push_bind(PAGE_SIZE + 1);
    builder.push(" OFFSET ");
    builder.push_bind((page - 1) * PAGE_SIZE);

    let mut rows = builder
        .build_query_as::<Publication>()
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Database error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let has_next = rows.len() as i64 > PAGE_SIZE;
    rows.truncate(PAGE_SIZE as usize);

    let mut publications = Vec::with_capacity(rows.len());
    for publication in rows {
        let authors = super::ordered_author_names(&pool, publication.id)
            .await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .join(", ");
        publications.push(PublicationListItem {
            id: publication.id.to_string(),
            title: publication.title,
            authors,
            journal: publication.journal.unwrap_or_default(),
            year: publication
                .publication_year
                .map(|y| y.to_string())
                .unwrap_or_default(),
            doi: publication.doi.unwrap_or_default(),
        });
    }

    let years: Vec<String> = sqlx::query_scalar::<_, i64>(
        "SELECT DISTINCT publication_year FROM publications
         WHERE publication_year IS NOT NULL ORDER BY publication_year DESC",
    )
    .fetch_all(&pool)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
    .into_iter()
    .map(|y| y.to_string())
    .collect();

    let people = sqlx::query_as::<_, Person>(
        "SELECT id, first_name, last_name, email, orcid, affiliation, created_at, updated_at
         FROM people ORDER BY last_name, first_name",
    )
    .fetch_all(&pool)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
    .into_iter()
    .map(|p| FilterPerson {
        id: p.id.to_string(),
        name: p.display_name(),
    })
    .collect();

    // Carried through pagination links so filters survive page changes.
    let mut filter_query = String::new();
    if !params.year.is_empty() {
        filter_query.push_str(&format!("&year={}", params.year));
    }
    if !params.author.is_empty() {
        filter_query.push_str(&format!("&author={}", params.author));
    }
    if !params.search.is_empty() {
        filter_query.push_str(&format!("&search={}", params.search));
    }

    let template = PublicationsListTemplate {
        publications,
        years,
        people,
        current_year: params.year,
        current_author: params.author,
        current_search: params.search,
        filter_query,
        page,
        prev_page: page - 1,
        next_page: page + 1,
        has_prev: page > 1,
        has_next,
    };
    match template.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            tracing::error!("Template error: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub async fn publication_detail(
    Path(id): Path<String>,
    State(pool): State<SqlitePool>,
) -> Result<Response, StatusCode> {
    let publication_id = Uuid::parse_str(&id).map_err(|_| StatusCode::BAD_REQUEST)?;

    let publication = sqlx::query_as::<_, Publication>(
        "SELECT id, title, abstract_text, journal, conference, volume, issue, pages,
                publication_date, publication_year, doi, pmid, arxiv_id, isbn, url, keywords,
                research_field, citation_count, impact_factor, notes, corresponding_author_id,
                created_at, updated_at
         FROM publications WHERE id = ?",
    )
    .bind(publication_id)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Database error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?
    .ok_or(StatusCode::NOT_FOUND)?;

    let author_rows: Vec<(Uuid, String, String, Contribution)> = sqlx::query_as(
        "SELECT p.id, p.first_name, p.last_name, ao.contribution
         FROM author_orders ao
         JOIN people p ON p.id = ao.person_id
         WHERE ao.publication_id = ?
         ORDER BY ao.position",
    )
    .bind(publication_id)
    .fetch_all(&pool)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let authors = author_rows
        .into_iter()
        .map(|(person_id, first, last, contribution)| DetailAuthor {
            person_id: person_id.to_string(),
            name: if first.is_empty() {
                last
            } else {
                format!("{first} {last}")
            },
            contribution: contribution.label().to_string(),
        })
        .collect();

    let corresponding = match publication.corresponding_author_id {
        Some(person_id) => sqlx::query_as::<_, Person>(
            "SELECT id, first_name, last_name, email, orcid, affiliation, created_at, updated_at
             FROM people WHERE id = ?",
        )
        .bind(person_id)
        .fetch_optional(&pool)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .map(|p| p.display_name())
        .unwrap_or_default(),
        None => String::new(),
    };

    let keywords = publication.keywords_list();
    let template = PublicationDetailTemplate {
        title: publication.title,
        abstract_text: publication.abstract_text.unwrap_or_default(),
        journal: publication.journal.unwrap_or_default(),
        conference: publication.conference.unwrap_or_default(),
        volume: publication.volume.unwrap_or_default(),
        issue: publication.issue.unwrap_or_default(),
        pages: publication.pages.unwrap_or_default(),
        year: publication
            .publication_year
            .map(|y| y.to_string())
            .unwrap_or_default(),
        publication_date: publication
            .publication_date
            .map(|d| d.to_string())
            .unwrap_or_default(),
        doi: publication.doi.unwrap_or_default(),
        pmid: publication.pmid.unwrap_or_default(),
        arxiv_id: publication.arxiv_id.unwrap_or_default(),
        isbn: publication.isbn.unwrap_or_default(),
        url: publication.url.unwrap_or_default(),
        research_field: publication.research_field.unwrap_or_default(),
        citation_count: publication.citation_count,
        notes: publication.notes.unwrap_or_default(),
        keywords,
        authors,
        corresponding,
    };
    match template.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            tracing::error!("Template error: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
