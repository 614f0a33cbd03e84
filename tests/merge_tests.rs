mod common;

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use scholardb::merge::{find_duplicate_candidates, merge_people, MergeError};

async fn insert_person(pool: &SqlitePool, first: &str, last: &str, orcid: Option<&str>) -> Uuid {
    let id = Uuid::new_v4();
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO people (id, first_name, last_name, orcid, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(first)
    .bind(last)
    .bind(orcid)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .unwrap();
    id
}

async fn insert_publication(pool: &SqlitePool, title: &str) -> Uuid {
    let id = Uuid::new_v4();
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO publications (id, title, citation_count, created_at, updated_at)
         VALUES (?, ?, 0, ?, ?)",
    )
    .bind(id)
    .bind(title)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .unwrap();
    id
}

async fn insert_author_order(
    pool: &SqlitePool,
    publication: Uuid,
    person: Uuid,
    position: i64,
    contribution: &str,
) {
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO author_orders (id, publication_id, person_id, position, contribution,
                                    created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(Uuid::new_v4())
    .bind(publication)
    .bind(person)
    .bind(position)
    .bind(contribution)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .unwrap();
}

async fn author_rows(pool: &SqlitePool, publication: Uuid) -> Vec<(Uuid, i64, String)> {
    sqlx::query_as(
        "SELECT person_id, position, contribution FROM author_orders
         WHERE publication_id = ? ORDER BY position",
    )
    .bind(publication)
    .fetch_all(pool)
    .await
    .unwrap()
}

#[tokio::test]
async fn merge_moves_and_collapses_author_orders() {
    let pool = common::create_test_pool().await;

    let target = insert_person(&pool, "John", "Smith", None).await;
    let source = insert_person(&pool, "J.", "Smith", None).await;
    let other = insert_person(&pool, "Maria", "Rossi", None).await;

    // Publication where both duplicates appear: collapse expected
    let shared = insert_publication(&pool, "Shared publication").await;
    insert_author_order(&pool, shared, source, 0, "first").await;
    insert_author_order(&pool, shared, other, 1, "normal").await;
    insert_author_order(&pool, shared, target, 2, "normal").await;

    // Publication where only the duplicate appears: plain move
    let solo = insert_publication(&pool, "Solo publication").await;
    insert_author_order(&pool, solo, source, 0, "first").await;

    let summary = merge_people(&pool, target, source).await.unwrap();
    assert_eq!(summary.author_orders_moved, 1);
    assert_eq!(summary.author_orders_dropped, 1);
    assert_eq!(summary.publications_resequenced, 2);

    // Collapsed row took the smaller position and the stronger label,
    // and positions are dense again.
    let shared_rows = author_rows(&pool, shared).await;
    assert_eq!(shared_rows.len(), 2);
    assert_eq!(shared_rows[0], (target, 0, "first".into()));
    assert_eq!(shared_rows[1], (other, 1, "normal".into()));

    let solo_rows = author_rows(&pool, solo).await;
    assert_eq!(solo_rows, vec![(target, 0, "first".into())]);

    // Duplicate person is gone
    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM people")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(remaining, 2);
}

#[tokio::test]
async fn merge_rewrites_corresponding_and_dissertations() {
    let pool = common::create_test_pool().await;

    let target = insert_person(&pool, "Anna", "Keller", None).await;
    let source = insert_person(&pool, "A.", "Keller", Some("0000-0002-1825-0097")).await;
    let student = insert_person(&pool, "Sam", "Student", None).await;

    let publication = insert_publication(&pool, "Corresponding test").await;
    sqlx::query("UPDATE publications SET corresponding_author_id = ? WHERE id = ?")
        .bind(source)
        .bind(publication)
        .execute(&pool)
        .await
        .unwrap();

    let dissertation_id = Uuid::new_v4();
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO dissertations (id, title, author_id, promoter_id, degree,
                                    created_at, updated_at)
         VALUES (?, ?, ?, ?, 'PhD', ?, ?)",
    )
    .bind(dissertation_id)
    .bind("Student thesis")
    .bind(student)
    .bind(source)
    .bind(now)
    .bind(now)
    .execute(&pool)
    .await
    .unwrap();

    // Source is also co-promoter on the same dissertation; target already
    // is one, so the rewrite must collapse rather than duplicate.
    for person in [source, target] {
        sqlx::query(
            "INSERT INTO dissertation_copromoters (dissertation_id, person_id) VALUES (?, ?)",
        )
        .bind(dissertation_id)
        .bind(person)
        .execute(&pool)
        .await
        .unwrap();
    }

    let summary = merge_people(&pool, target, source).await.unwrap();
    assert_eq!(summary.corresponding_rewritten, 1);
    assert_eq!(summary.dissertations_rewritten, 1);

    let corresponding: Option<Uuid> =
        sqlx::query_scalar("SELECT corresponding_author_id FROM publications WHERE id = ?")
            .bind(publication)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(corresponding, Some(target));

    let promoter: Uuid =
        sqlx::query_scalar("SELECT promoter_id FROM dissertations WHERE id = ?")
            .bind(dissertation_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(promoter, target);

    let copromoters: Vec<Uuid> = sqlx::query_scalar(
        "SELECT person_id FROM dissertation_copromoters WHERE dissertation_id = ?",
    )
    .bind(dissertation_id)
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(copromoters, vec![target]);

    // Empty ORCID on target was filled from the duplicate
    let orcid: Option<String> = sqlx::query_scalar("SELECT orcid FROM people WHERE id = ?")
        .bind(target)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(orcid.as_deref(), Some("0000-0002-1825-0097"));
}

#[tokio::test]
async fn merge_refuses_self_and_missing() {
    let pool = common::create_test_pool().await;
    let person = insert_person(&pool, "Only", "One", None).await;

    assert!(matches!(
        merge_people(&pool, person, person).await,
        Err(MergeError::SelfMerge)
    ));
    assert!(matches!(
        merge_people(&pool, person, Uuid::new_v4()).await,
        Err(MergeError::NotFound(_))
    ));
    assert!(matches!(
        merge_people(&pool, Uuid::new_v4(), person).await,
        Err(MergeError::NotFound(_))
    ));
}

#[tokio::test]
async fn duplicate_candidates_ranked_by_similarity() {
    let pool = common::create_test_pool().await;
    insert_person(&pool, "José", "García", None).await;
    insert_person(&pool, "Jose", "Garcia", None).await;
    insert_person(&pool, "Ann", "O'Brien", None).await;
    insert_person(&pool, "Ann", "OBrien", None).await;
    insert_person(&pool, "Unrelated", "Person", None).await;

    let candidates = find_duplicate_candidates(&pool).await.unwrap();
    assert_eq!(candidates.len(), 2);
    // Exact key collision sorts above the loose match
    assert_eq!(candidates[0].similarity, 1.0);
    assert!(candidates[1].similarity >= 0.9);
}
