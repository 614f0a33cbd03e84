//! Database connection and schema management.
//!
//! The schema is created by the application at startup so a fresh database
//! file is usable without any external migration step.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

/// Open (and create if missing) the SQLite database at `url`.
///
/// `url` accepts the usual sqlx forms, e.g. `sqlite://scholardb.db` or
/// `sqlite::memory:`. Foreign key enforcement is switched on for every
/// connection; the schema relies on it for cascades.
pub async fn connect(url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}

/// Create all tables and indexes if they do not exist yet.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    info!("Ensuring database schema");

    let statements = [
        r#"
        CREATE TABLE IF NOT EXISTS people (
            id BLOB PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT,
            orcid TEXT,
            affiliation TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS publications (
            id BLOB PRIMARY KEY,
            title TEXT NOT NULL,
            abstract_text TEXT,
            journal TEXT,
            conference TEXT,
            volume TEXT,
            issue TEXT,
            pages TEXT,
            publication_date TEXT,
            publication_year INTEGER,
            doi TEXT,
            pmid TEXT,
            arxiv_id TEXT,
            isbn TEXT,
            url TEXT,
            keywords TEXT,
            research_field TEXT,
            citation_count INTEGER NOT NULL DEFAULT 0,
            impact_factor REAL,
            notes TEXT,
            corresponding_author_id BLOB
                REFERENCES people(id) ON DELETE SET NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS author_orders (
            id BLOB PRIMARY KEY,
            publication_id BLOB NOT NULL
                REFERENCES publications(id) ON DELETE CASCADE,
            person_id BLOB NOT NULL
                REFERENCES people(id) ON DELETE CASCADE,
            position INTEGER NOT NULL DEFAULT 0,
            contribution TEXT NOT NULL DEFAULT 'normal',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (publication_id, person_id)
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS dissertations (
            id BLOB PRIMARY KEY,
            title TEXT NOT NULL,
            author_id BLOB NOT NULL
                REFERENCES people(id) ON DELETE CASCADE,
            promoter_id BLOB NOT NULL
                REFERENCES people(id) ON DELETE CASCADE,
            supervisor_id BLOB
                REFERENCES people(id) ON DELETE SET NULL,
            degree TEXT NOT NULL DEFAULT 'PhD',
            start_date TEXT,
            defense_date TEXT,
            abstract_text TEXT,
            institution TEXT,
            department TEXT,
            url TEXT,
            keywords TEXT,
            notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS dissertation_copromoters (
            dissertation_id BLOB NOT NULL
                REFERENCES dissertations(id) ON DELETE CASCADE,
            person_id BLOB NOT NULL
                REFERENCES people(id) ON DELETE CASCADE,
            PRIMARY KEY (dissertation_id, person_id)
        )
        "#,
        "CREATE INDEX IF NOT EXISTS idx_publications_doi ON publications(doi)",
        "CREATE INDEX IF NOT EXISTS idx_publications_year ON publications(publication_year)",
        "CREATE INDEX IF NOT EXISTS idx_people_orcid ON people(orcid)",
        "CREATE INDEX IF NOT EXISTS idx_author_orders_publication
             ON author_orders(publication_id, position)",
        "CREATE INDEX IF NOT EXISTS idx_author_orders_person ON author_orders(person_id)",
    ];

    for stmt in statements {
        sqlx::query(stmt).execute(pool).await?;
    }

    Ok(())
}
