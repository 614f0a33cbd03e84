use axum::{
    routing::{get, post},
    Router,
};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

/// Create an isolated in-memory test database.
///
/// A single connection keeps every query on the same in-memory database;
/// with a larger pool each connection would see its own empty one.
pub async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .expect("Failed to enable foreign keys");

    scholardb::db::init_schema(&pool)
        .await
        .expect("Failed to create schema");
    pool
}

/// Create the application router for testing (no auth middleware).
pub fn create_test_app(pool: SqlitePool) -> Router {
    use scholardb::handlers;

    Router::new()
        // Web views
        .route("/", get(handlers::web::home))
        .route("/publications", get(handlers::web::publications_list))
        .route("/publications/{id}", get(handlers::web::publication_detail))
        .route("/dissertations", get(handlers::web::dissertations_list))
        .route("/dissertations/{id}", get(handlers::web::dissertation_detail))
        // People routes
        .route("/api/people", get(handlers::list_people).post(handlers::create_person))
        .route("/api/people/duplicates", get(handlers::list_duplicates))
        .route(
            "/api/people/{id}",
            get(handlers::get_person)
                .put(handlers::update_person)
                .delete(handlers::delete_person),
        )
        .route("/api/people/{id}/merge", post(handlers::merge_person))
        // Publication routes
        .route(
            "/api/publications",
            get(handlers::list_publications).post(handlers::create_publication),
        )
        .route(
            "/api/publications/{id}",
            get(handlers::get_publication)
                .put(handlers::update_publication)
                .delete(handlers::delete_publication),
        )
        .route(
            "/api/publications/{id}/authors",
            get(handlers::list_publication_authors),
        )
        // Author order routes
        .route(
            "/api/author-orders",
            get(handlers::list_author_orders).post(handlers::create_author_order),
        )
        .route(
            "/api/author-orders/{id}",
            get(handlers::get_author_order)
                .put(handlers::update_author_order)
                .delete(handlers::delete_author_order),
        )
        // Dissertation routes
        .route(
            "/api/dissertations",
            get(handlers::list_dissertations).post(handlers::create_dissertation),
        )
        .route(
            "/api/dissertations/{id}",
            get(handlers::get_dissertation)
                .put(handlers::update_dissertation)
                .delete(handlers::delete_dissertation),
        )
        .route(
            "/api/dissertations/{id}/copromoters",
            get(handlers::list_copromoters),
        )
        .with_state(pool)
}
