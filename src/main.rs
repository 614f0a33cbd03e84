use axum::{
    routing::{get, post},
    Json, Router,
};
use dotenvy::dotenv;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;

use scholardb::handlers;
use scholardb::merge::{DuplicateCandidate, MergeSummary};
use scholardb::models::{
    AuthorOrder, Contribution, CreateAuthorOrder, CreateDissertation, CreatePerson,
    CreatePublication, Degree, Dissertation, MergeRequest, Person, Publication,
    UpdateAuthorOrder, UpdateDissertation, UpdatePerson, UpdatePublication,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::people::list_people,
        handlers::people::get_person,
        handlers::people::create_person,
        handlers::people::update_person,
        handlers::people::delete_person,
        handlers::people::merge_person,
        handlers::people::list_duplicates,
        handlers::publications::list_publications,
        handlers::publications::get_publication,
        handlers::publications::list_publication_authors,
        handlers::publications::create_publication,
        handlers::publications::update_publication,
        handlers::publications::delete_publication,
        handlers::author_orders::list_author_orders,
        handlers::author_orders::get_author_order,
        handlers::author_orders::create_author_order,
        handlers::author_orders::update_author_order,
        handlers::author_orders::delete_author_order,
        handlers::dissertations::list_dissertations,
        handlers::dissertations::get_dissertation,
        handlers::dissertations::list_copromoters,
        handlers::dissertations::create_dissertation,
        handlers::dissertations::update_dissertation,
        handlers::dissertations::delete_dissertation,
    ),
    components(schemas(
        Person, CreatePerson, UpdatePerson, MergeRequest, MergeSummary, DuplicateCandidate,
        Publication, CreatePublication, UpdatePublication,
        AuthorOrder, CreateAuthorOrder, UpdateAuthorOrder, Contribution,
        Dissertation, CreateDissertation, UpdateDissertation, Degree,
        handlers::publications::PublicationAuthor,
    )),
    tags(
        (name = "people", description = "Authors and advisors"),
        (name = "publications", description = "Publications and their author order"),
        (name = "author-orders", description = "Publication/person links"),
        (name = "dissertations", description = "Dissertations and supervision")
    )
)]
struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://scholardb.db".to_string());
    let pool = scholardb::db::connect(&database_url).await?;
    scholardb::db::init_schema(&pool).await?;

    // Mutating API routes require a bearer token; web views are read-only.
    let api = Router::new()
        .route(
            "/api/people",
            get(handlers::list_people).post(handlers::create_person),
        )
        .route("/api/people/duplicates", get(handlers::list_duplicates))
        .route(
            "/api/people/{id}",
            get(handlers::get_person)
                .put(handlers::update_person)
                .delete(handlers::delete_person),
        )
        .route("/api/people/{id}/merge", post(handlers::merge_person))
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
        .route_layer(axum::middleware::from_fn(
            scholardb::middleware::require_api_token,
        ));

    let app = Router::new()
        .route("/", get(handlers::web::home))
        .route("/publications", get(handlers::web::publications_list))
        .route("/publications/{id}", get(handlers::web::publication_detail))
        .route("/dissertations", get(handlers::web::dissertations_list))
        .route(
            "/dissertations/{id}",
            get(handlers::web::dissertation_detail),
        )
        .route("/api-docs/openapi.json", get(openapi_json))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .with_state(pool);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Server is running on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
