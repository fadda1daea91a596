//! API integration tests
//!
//! Need a running server plus its database. Fixtures are written straight to
//! the database; tokens are minted with the server's secret.
//! Run with: DATABASE_URL=... JWT_SECRET=... cargo test -- --ignored

use catalog_server::models::user::{Permission, UserClaims};
use chrono::{Duration, Local, NaiveDate, Utc};
use reqwest::{header, redirect, Client, StatusCode};
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:8080/api/v1";

fn client() -> Client {
    Client::builder()
        .redirect(redirect::Policy::none())
        .build()
        .expect("Failed to build client")
}

async fn pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    PgPool::connect(&url).await.expect("Failed to connect to database")
}

fn token(user_id: i32, permissions: &[Permission]) -> String {
    let secret = std::env::var("JWT_SECRET")
        .unwrap_or_else(|_| "change-this-secret-in-production".to_string());
    let now = Utc::now();
    UserClaims {
        sub: format!("user{}", user_id),
        user_id,
        is_superuser: false,
        permissions: permissions.iter().map(|p| p.codename().to_string()).collect(),
        exp: (now + Duration::hours(1)).timestamp(),
        iat: now.timestamp(),
    }
    .create_token(&secret)
    .expect("Failed to mint token")
}

fn unique_isbn() -> String {
    format!("978{:010}", Uuid::new_v4().as_u128() % 10_000_000_000)
}

/// A book with one copy on loan to each of two fresh users
struct Fixture {
    book_id: i32,
    isbn: String,
    author_id: i32,
    language_id: i32,
    genre_id: i32,
    user_a: i32,
    user_b: i32,
    copy_a: Uuid,
    copy_b: Uuid,
}

async fn fixture(pool: &PgPool) -> Fixture {
    let tag = Uuid::new_v4().simple().to_string();
    let today = Local::now().date_naive();

    let mut user_ids = Vec::new();
    for name in ["a", "b"] {
        let id: i32 = sqlx::query_scalar("INSERT INTO users (username) VALUES ($1) RETURNING id")
            .bind(format!("{}-{}", name, tag))
            .fetch_one(pool)
            .await
            .unwrap();
        user_ids.push(id);
    }

    let language_id: i32 = sqlx::query_scalar("INSERT INTO languages (name) VALUES ($1) RETURNING id")
        .bind(format!("Language {}", tag))
        .fetch_one(pool)
        .await
        .unwrap();
    let genre_id: i32 = sqlx::query_scalar("INSERT INTO genres (name) VALUES ($1) RETURNING id")
        .bind(format!("Genre {}", tag))
        .fetch_one(pool)
        .await
        .unwrap();
    let author_id = insert_author(pool, &tag).await;
    let isbn = unique_isbn();
    let book_id: i32 = sqlx::query_scalar(
        "INSERT INTO books (title, summary, isbn, author_id, language_id) \
         VALUES ($1, 'Summary', $2, $3, $4) RETURNING id",
    )
    .bind(format!("Book {}", tag))
    .bind(&isbn)
    .bind(author_id)
    .bind(language_id)
    .fetch_one(pool)
    .await
    .unwrap();
    sqlx::query("INSERT INTO book_genres (book_id, genre_id) VALUES ($1, $2)")
        .bind(book_id)
        .bind(genre_id)
        .execute(pool)
        .await
        .unwrap();

    let mut copies = Vec::new();
    for borrower in &user_ids {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO book_instances (id, book_id, imprint, due_back, status, borrower_id) \
             VALUES ($1, $2, 'Imprint', $3, 'o', $4)",
        )
        .bind(id)
        .bind(book_id)
        .bind(today + Duration::days(7))
        .bind(borrower)
        .execute(pool)
        .await
        .unwrap();
        copies.push(id);
    }

    Fixture {
        book_id,
        isbn,
        author_id,
        language_id,
        genre_id,
        user_a: user_ids[0],
        user_b: user_ids[1],
        copy_a: copies[0],
        copy_b: copies[1],
    }
}

async fn insert_author(pool: &PgPool, tag: &str) -> i32 {
    sqlx::query_scalar(
        "INSERT INTO authors (first_name, last_name, date_of_birth) VALUES ('Ann', $1, '1950-01-01') RETURNING id",
    )
    .bind(format!("Author {}", tag))
    .fetch_one(pool)
    .await
    .unwrap()
}

fn book_form(fx: &Fixture, isbn: &str) -> Value {
    json!({
        "title": "New title",
        "author_id": fx.author_id,
        "summary": "A summary",
        "isbn": isbn,
        "genre_ids": [fx.genre_id],
        "language_id": fx.language_id,
    })
}

async fn due_back(pool: &PgPool, id: Uuid) -> Option<NaiveDate> {
    sqlx::query_scalar("SELECT due_back FROM book_instances WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let response = client()
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_visit_counter_per_session() {
    let client = client();

    let first = client.get(format!("{}/", BASE_URL)).send().await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let cookie = first
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .expect("No session cookie")
        .to_string();
    let body: Value = first.json().await.unwrap();
    assert_eq!(body["num_visits"], 1);
    assert!(body["num_books"].is_i64());

    for expected in 2..=3 {
        let body: Value = client
            .get(format!("{}/", BASE_URL))
            .header(header::COOKIE, &cookie)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["num_visits"], expected);
    }
}

#[tokio::test]
#[ignore]
async fn test_valid_renewal_redirects_to_borrowed() {
    let pool = pool().await;
    let fx = fixture(&pool).await;
    let new_date = Local::now().date_naive() + Duration::weeks(2);

    let response = client()
        .post(format!("{}/bookinstances/{}/renew", BASE_URL, fx.copy_a))
        .bearer_auth(token(fx.user_b, &[Permission::CanMarkReturned]))
        .json(&json!({ "renewal_date": new_date.to_string() }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/api/v1/borrowed");
    assert_eq!(due_back(&pool, fx.copy_a).await, Some(new_date));
}

#[tokio::test]
#[ignore]
async fn test_out_of_window_renewal_is_rejected() {
    let pool = pool().await;
    let fx = fixture(&pool).await;
    let before = due_back(&pool, fx.copy_a).await;
    let today = Local::now().date_naive();

    for (date, message) in [
        (today - Duration::days(1), "Invalid date - renewal in past"),
        (
            today + Duration::weeks(4) + Duration::days(1),
            "Invalid date - renewal more than 4 weeks ahead",
        ),
    ] {
        let response = client()
            .post(format!("{}/bookinstances/{}/renew", BASE_URL, fx.copy_a))
            .bearer_auth(token(fx.user_b, &[Permission::CanMarkReturned]))
            .json(&json!({ "renewal_date": date.to_string() }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["errors"]["renewal_date"][0], message);
        assert_eq!(body["renewal_date"], date.to_string());
    }

    assert_eq!(due_back(&pool, fx.copy_a).await, before);
}

#[tokio::test]
#[ignore]
async fn test_my_books_only_lists_own_copies() {
    let pool = pool().await;
    let fx = fixture(&pool).await;

    let body: Value = client()
        .get(format!("{}/mybooks", BASE_URL))
        .bearer_auth(token(fx.user_a, &[]))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let items = body["items"].as_array().expect("No items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], fx.copy_a.to_string());
    assert!(items
        .iter()
        .all(|copy| copy["borrower_id"] == fx.user_a && copy["id"] != fx.copy_b.to_string()));
}

#[tokio::test]
#[ignore]
async fn test_missing_records_are_not_found() {
    let client = client();
    for path in ["books/2147483647", "authors/2147483647"] {
        let response = client.get(format!("{}/{}", BASE_URL, path)).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    let response = client
        .get(format!("{}/books?page=100000", BASE_URL))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_book_creation_requires_can_edit() {
    let pool = pool().await;
    let fx = fixture(&pool).await;
    let isbn = unique_isbn();
    let form = book_form(&fx, &isbn);

    let response = client()
        .post(format!("{}/books/create", BASE_URL))
        .bearer_auth(token(fx.user_a, &[Permission::CanMarkReturned]))
        .json(&form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE isbn = $1")
        .bind(&isbn)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stored, 0);

    let response = client()
        .post(format!("{}/books/create", BASE_URL))
        .bearer_auth(token(fx.user_a, &[Permission::CanEdit]))
        .json(&form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers()[header::LOCATION].to_str().unwrap().to_string();
    assert!(location.starts_with("/api/v1/books/"));
    assert_ne!(location, format!("/api/v1/books/{}", fx.book_id));
}

#[tokio::test]
#[ignore]
async fn test_return_then_lend_keeps_borrower_consistent() {
    let pool = pool().await;
    let fx = fixture(&pool).await;
    let staff = token(fx.user_b, &[Permission::CanMarkReturned]);

    let returned: Value = client()
        .post(format!("{}/bookinstances/{}/return", BASE_URL, fx.copy_a))
        .bearer_auth(&staff)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(returned["status"], "available");
    assert!(returned["borrower_id"].is_null());

    let lent: Value = client()
        .post(format!("{}/bookinstances/{}/lend", BASE_URL, fx.copy_a))
        .bearer_auth(&staff)
        .json(&json!({ "borrower_id": fx.user_b }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(lent["status"], "on_loan");
    assert_eq!(lent["borrower_id"], fx.user_b);
}

#[tokio::test]
#[ignore]
async fn test_renewal_of_unknown_copy_is_not_found() {
    let pool = pool().await;
    let fx = fixture(&pool).await;
    let date = Local::now().date_naive() + Duration::weeks(1);

    let response = client()
        .post(format!("{}/bookinstances/{}/renew", BASE_URL, Uuid::new_v4()))
        .bearer_auth(token(fx.user_b, &[Permission::CanMarkReturned]))
        .json(&json!({ "renewal_date": date.to_string() }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_renewal_of_returned_copy_is_rejected() {
    let pool = pool().await;
    let fx = fixture(&pool).await;
    let staff = token(fx.user_b, &[Permission::CanMarkReturned]);

    let response = client()
        .post(format!("{}/bookinstances/{}/return", BASE_URL, fx.copy_a))
        .bearer_auth(&staff)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let date = Local::now().date_naive() + Duration::weeks(1);
    let response = client()
        .post(format!("{}/bookinstances/{}/renew", BASE_URL, fx.copy_a))
        .bearer_auth(&staff)
        .json(&json!({ "renewal_date": date.to_string() }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(due_back(&pool, fx.copy_a).await, None);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_isbn_is_a_conflict() {
    let pool = pool().await;
    let fx = fixture(&pool).await;

    let response = client()
        .post(format!("{}/books/create", BASE_URL))
        .bearer_auth(token(fx.user_a, &[Permission::CanEdit]))
        .json(&book_form(&fx, &fx.isbn))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE isbn = $1")
        .bind(&fx.isbn)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stored, 1);
}

#[tokio::test]
#[ignore]
async fn test_book_with_copies_cannot_be_deleted() {
    let pool = pool().await;
    let fx = fixture(&pool).await;

    let response = client()
        .post(format!("{}/books/{}/delete", BASE_URL, fx.book_id))
        .bearer_auth(token(fx.user_a, &[Permission::CanEdit]))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = client()
        .get(format!("{}/books/{}", BASE_URL, fx.book_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore]
async fn test_book_delete_redirects_to_listing() {
    let pool = pool().await;
    let fx = fixture(&pool).await;
    let editor = token(fx.user_a, &[Permission::CanEdit]);

    let response = client()
        .post(format!("{}/books/create", BASE_URL))
        .bearer_auth(&editor)
        .json(&book_form(&fx, &unique_isbn()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let detail = response.headers()[header::LOCATION].to_str().unwrap().to_string();

    let response = client()
        .post(format!("http://localhost:8080{}/delete", detail))
        .bearer_auth(&editor)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/api/v1/books");

    let response = client()
        .get(format!("http://localhost:8080{}", detail))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_author_delete_redirects_to_listing() {
    let pool = pool().await;
    let author_id = insert_author(&pool, &Uuid::new_v4().simple().to_string()).await;

    let response = client()
        .post(format!("{}/authors/{}/delete", BASE_URL, author_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/api/v1/authors");

    let response = client()
        .get(format!("{}/authors/{}", BASE_URL, author_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
