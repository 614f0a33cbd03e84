mod common;

use axum_test::TestServer;
use serde_json::{json, Value};

/// Helper to create a test server over a fresh in-memory database
async fn setup() -> TestServer {
    let pool = common::create_test_pool().await;
    let app = common::create_test_app(pool);
    TestServer::new(app).unwrap()
}

async fn create_person(server: &TestServer, first: &str, last: &str) -> Value {
    let response = server
        .post("/api/people")
        .json(&json!({ "first_name": first, "last_name": last }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json()
}

async fn create_publication(server: &TestServer, title: &str, year: i64) -> Value {
    let response = server
        .post("/api/publications")
        .json(&json!({ "title": title, "publication_year": year }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json()
}

// ============================================================================
// People API
// ============================================================================

#[tokio::test]
async fn test_person_crud() {
    let server = setup().await;

    let created = create_person(&server, "Marie", "Curie").await;
    let id = created["id"].as_str().unwrap();
    assert_eq!(created["first_name"], "Marie");
    assert_eq!(created["last_name"], "Curie");

    let fetched: Value = server.get(&format!("/api/people/{id}")).await.json();
    assert_eq!(fetched["id"], created["id"]);

    let updated = server
        .put(&format!("/api/people/{id}"))
        .json(&json!({ "affiliation": "Sorbonne" }))
        .await;
    updated.assert_status_ok();
    let updated: Value = updated.json();
    assert_eq!(updated["affiliation"], "Sorbonne");
    assert_eq!(updated["first_name"], "Marie");

    let deleted = server.delete(&format!("/api/people/{id}")).await;
    deleted.assert_status(axum::http::StatusCode::NO_CONTENT);

    let missing = server.get(&format!("/api/people/{id}")).await;
    missing.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_person_search() {
    let server = setup().await;
    create_person(&server, "Ada", "Lovelace").await;
    create_person(&server, "Grace", "Hopper").await;

    let results: Vec<Value> = server
        .get("/api/people")
        .add_query_param("search", "love")
        .await
        .json();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["last_name"], "Lovelace");

    let all: Vec<Value> = server.get("/api/people").await.json();
    assert_eq!(all.len(), 2);
    // Listing is ordered by last name
    assert_eq!(all[0]["last_name"], "Hopper");
}

#[tokio::test]
async fn test_person_orcid_validation() {
    let server = setup().await;

    let bad = server
        .post("/api/people")
        .json(&json!({
            "first_name": "Bad",
            "last_name": "Checksum",
            "orcid": "0000-0002-1825-0098"
        }))
        .await;
    bad.assert_status(axum::http::StatusCode::BAD_REQUEST);

    let good = server
        .post("/api/people")
        .json(&json!({
            "first_name": "Good",
            "last_name": "Checksum",
            "orcid": "https://orcid.org/0000-0002-1825-0097"
        }))
        .await;
    good.assert_status(axum::http::StatusCode::CREATED);
    let person: Value = good.json();
    // Stored in canonical bare form
    assert_eq!(person["orcid"], "0000-0002-1825-0097");
}

// ============================================================================
// Publications and author orders
// ============================================================================

#[tokio::test]
async fn test_publication_crud_and_filters() {
    let server = setup().await;

    let older = create_publication(&server, "Old result", 2019).await;
    let newer = create_publication(&server, "New result", 2024).await;

    let all: Vec<Value> = server.get("/api/publications").await.json();
    assert_eq!(all.len(), 2);
    // Ordered newest year first
    assert_eq!(all[0]["id"], newer["id"]);
    assert_eq!(all[1]["id"], older["id"]);

    let by_year: Vec<Value> = server
        .get("/api/publications")
        .add_query_param("year", "2019")
        .await
        .json();
    assert_eq!(by_year.len(), 1);
    assert_eq!(by_year[0]["id"], older["id"]);

    let by_search: Vec<Value> = server
        .get("/api/publications")
        .add_query_param("search", "New")
        .await
        .json();
    assert_eq!(by_search.len(), 1);

    let updated = server
        .put(&format!("/api/publications/{}", older["id"].as_str().unwrap()))
        .json(&json!({ "journal": "Annals of Results" }))
        .await;
    updated.assert_status_ok();
    let updated: Value = updated.json();
    assert_eq!(updated["journal"], "Annals of Results");
    assert_eq!(updated["title"], "Old result");
}

#[tokio::test]
async fn test_publication_doi_normalized() {
    let server = setup().await;

    let response = server
        .post("/api/publications")
        .json(&json!({
            "title": "Identified work",
            "doi": "https://doi.org/10.1000/ABC"
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    let publication: Value = response.json();
    assert_eq!(publication["doi"], "10.1000/abc");

    let bad = server
        .post("/api/publications")
        .json(&json!({ "title": "Bad DOI", "doi": "not a doi" }))
        .await;
    bad.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_author_orders_and_publication_authors() {
    let server = setup().await;

    let publication = create_publication(&server, "Joint work", 2023).await;
    let publication_id = publication["id"].as_str().unwrap();
    let alice = create_person(&server, "Alice", "Archer").await;
    let bob = create_person(&server, "Bob", "Builder").await;

    for (person, position, contribution) in [
        (&bob, 1, "last"),
        (&alice, 0, "first"),
    ] {
        let response = server
            .post("/api/author-orders")
            .json(&json!({
                "publication_id": publication_id,
                "person_id": person["id"],
                "position": position,
                "contribution": contribution
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
    }

    // Same person twice on one publication is rejected
    let duplicate = server
        .post("/api/author-orders")
        .json(&json!({
            "publication_id": publication_id,
            "person_id": alice["id"],
            "position": 2
        }))
        .await;
    duplicate.assert_status(axum::http::StatusCode::CONFLICT);

    // Joined author list comes back in position order
    let authors: Vec<Value> = server
        .get(&format!("/api/publications/{publication_id}/authors"))
        .await
        .json();
    assert_eq!(authors.len(), 2);
    assert_eq!(authors[0]["last_name"], "Archer");
    assert_eq!(authors[0]["contribution"], "first");
    assert_eq!(authors[1]["last_name"], "Builder");
    assert_eq!(authors[1]["contribution"], "last");

    // Publications filterable by author
    let by_author: Vec<Value> = server
        .get("/api/publications")
        .add_query_param("author", alice["id"].as_str().unwrap())
        .await
        .json();
    assert_eq!(by_author.len(), 1);
}

// ============================================================================
// Dissertations
// ============================================================================

#[tokio::test]
async fn test_dissertation_crud() {
    let server = setup().await;

    let author = create_person(&server, "Jane", "Scholar").await;
    let promoter = create_person(&server, "Pat", "Professor").await;
    let copromoter = create_person(&server, "Chris", "Colleague").await;

    let created = server
        .post("/api/dissertations")
        .json(&json!({
            "title": "On the Nature of Test Data",
            "author_id": author["id"],
            "promoter_id": promoter["id"],
            "copromoter_ids": [copromoter["id"]],
            "degree": "Master",
            "institution": "Test University"
        }))
        .await;
    created.assert_status(axum::http::StatusCode::CREATED);
    let dissertation: Value = created.json();
    assert_eq!(dissertation["degree"], "Master");
    let id = dissertation["id"].as_str().unwrap();

    let copromoters: Vec<Value> = server
        .get(&format!("/api/dissertations/{id}/copromoters"))
        .await
        .json();
    assert_eq!(copromoters.len(), 1);
    assert_eq!(copromoters[0]["last_name"], "Colleague");

    let by_degree: Vec<Value> = server
        .get("/api/dissertations")
        .add_query_param("degree", "Master")
        .await
        .json();
    assert_eq!(by_degree.len(), 1);

    let none: Vec<Value> = server
        .get("/api/dissertations")
        .add_query_param("degree", "PhD")
        .await
        .json();
    assert!(none.is_empty());

    // Filter by person in any role
    let by_person: Vec<Value> = server
        .get("/api/dissertations")
        .add_query_param("person", copromoter["id"].as_str().unwrap())
        .await
        .json();
    assert_eq!(by_person.len(), 1);
}

// ============================================================================
// Merge and duplicates
// ============================================================================

#[tokio::test]
async fn test_merge_endpoint() {
    let server = setup().await;

    let target = create_person(&server, "José", "García").await;
    let source = create_person(&server, "Jose", "Garcia").await;
    let publication = create_publication(&server, "Shared paper", 2022).await;

    let response = server
        .post("/api/author-orders")
        .json(&json!({
            "publication_id": publication["id"],
            "person_id": source["id"],
            "position": 0,
            "contribution": "first"
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);

    let target_id = target["id"].as_str().unwrap();
    let merged = server
        .post(&format!("/api/people/{target_id}/merge"))
        .json(&json!({ "source_id": source["id"] }))
        .await;
    merged.assert_status_ok();
    let summary: Value = merged.json();
    assert_eq!(summary["author_orders_moved"], 1);

    // Source is gone, target now authors the paper
    let missing = server
        .get(&format!("/api/people/{}", source["id"].as_str().unwrap()))
        .await;
    missing.assert_status(axum::http::StatusCode::NOT_FOUND);

    let authors: Vec<Value> = server
        .get(&format!(
            "/api/publications/{}/authors",
            publication["id"].as_str().unwrap()
        ))
        .await
        .json();
    assert_eq!(authors.len(), 1);
    assert_eq!(authors[0]["person_id"], target["id"]);
}

#[tokio::test]
async fn test_merge_rejects_self_and_unknown() {
    let server = setup().await;
    let person = create_person(&server, "Solo", "Author").await;
    let id = person["id"].as_str().unwrap();

    let self_merge = server
        .post(&format!("/api/people/{id}/merge"))
        .json(&json!({ "source_id": person["id"] }))
        .await;
    self_merge.assert_status(axum::http::StatusCode::BAD_REQUEST);

    let unknown = server
        .post(&format!("/api/people/{id}/merge"))
        .json(&json!({ "source_id": "00000000-0000-0000-0000-000000000000" }))
        .await;
    unknown.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicates_listing() {
    let server = setup().await;
    create_person(&server, "José", "García").await;
    create_person(&server, "Jose", "Garcia").await;
    create_person(&server, "Totally", "Different").await;

    let duplicates: Vec<Value> = server.get("/api/people/duplicates").await.json();
    assert_eq!(duplicates.len(), 1);
    assert!(duplicates[0]["similarity"].as_f64().unwrap() > 0.99);
}

// ============================================================================
// Web views
// ============================================================================

#[tokio::test]
async fn test_home_page_renders() {
    let server = setup().await;
    create_publication(&server, "Visible on home", 2024).await;

    let response = server.get("/").await;
    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains("Visible on home"));
}

#[tokio::test]
async fn test_publication_pages_render() {
    let server = setup().await;
    let publication = create_publication(&server, "A very public paper", 2021).await;
    let person = create_person(&server, "Page", "Author").await;
    server
        .post("/api/author-orders")
        .json(&json!({
            "publication_id": publication["id"],
            "person_id": person["id"],
            "position": 0,
            "contribution": "first"
        }))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    let list = server.get("/publications").await;
    list.assert_status_ok();
    assert!(list.text().contains("A very public paper"));

    // Year filter hides non-matching rows
    let filtered = server
        .get("/publications")
        .add_query_param("year", "1999")
        .await;
    filtered.assert_status_ok();
    assert!(!filtered.text().contains("A very public paper"));

    let detail = server
        .get(&format!(
            "/publications/{}",
            publication["id"].as_str().unwrap()
        ))
        .await;
    detail.assert_status_ok();
    let html = detail.text();
    assert!(html.contains("A very public paper"));
    assert!(html.contains("Page Author"));
    assert!(html.contains("first author"));
}

#[tokio::test]
async fn test_dissertation_pages_render() {
    let server = setup().await;
    let author = create_person(&server, "Dee", "Fender").await;
    let promoter = create_person(&server, "Ad", "Visor").await;
    let created: Value = server
        .post("/api/dissertations")
        .json(&json!({
            "title": "Defensive Writing",
            "author_id": author["id"],
            "promoter_id": promoter["id"]
        }))
        .await
        .json();

    let list = server.get("/dissertations").await;
    list.assert_status_ok();
    assert!(list.text().contains("Defensive Writing"));

    let detail = server
        .get(&format!("/dissertations/{}", created["id"].as_str().unwrap()))
        .await;
    detail.assert_status_ok();
    let html = detail.text();
    assert!(html.contains("Defensive Writing"));
    assert!(html.contains("Ad Visor"));
}
