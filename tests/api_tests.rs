//! API integration tests, driving the router in-process against a fresh
//! in-memory database.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use tower::util::ServiceExt;

use booklib_server::{api, config::AppConfig, repository::Repository, services::Services, AppState};

async fn test_app() -> Router {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    let repository = Repository::new(pool);
    repository
        .books
        .create_schema()
        .await
        .expect("Failed to create schema");
    let services = Services::new(repository);
    let state = AppState {
        config: Arc::new(AppConfig::default()),
        services: Arc::new(services),
    };
    api::create_router(state)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    serde_json::from_slice(&bytes).expect("Response body is not valid JSON")
}

#[tokio::test]
async fn test_health_check() {
    let app = test_app().await;

    let response = app.oneshot(get("/api/v1/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_readiness_check() {
    let app = test_app().await;

    let response = app.oneshot(get("/api/v1/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_create_and_get_book() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/books",
            &json!({
                "name": "The Great Gatsby",
                "author": "F. Scott Fitzgerald",
                "year_published": 1925,
                "book_type": "Fiction"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    let id = body["id"].as_i64().expect("created book has an id");
    assert_eq!(body["name"], "The Great Gatsby");
    assert_eq!(body["author"], "F. Scott Fitzgerald");
    assert_eq!(body["year_published"], 1925);
    assert_eq!(body["book_type"], "Fiction");

    let response = app
        .oneshot(get(&format!("/api/v1/books/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["name"], "The Great Gatsby");
}

#[tokio::test]
async fn test_create_book_invalid_payloads() {
    let app = test_app().await;

    let invalid_bodies = [
        // Missing field
        json!({"author": "Author Test", "year_published": 2020, "book_type": "Non-Fiction"}),
        // Explicit null
        json!({"name": null, "author": "Author Test", "year_published": 2020, "book_type": "Non-Fiction"}),
        // Wrong type
        json!({"name": 12345, "author": "Author Test", "year_published": 2020, "book_type": "Non-Fiction"}),
        // Oversized text
        json!({"name": "A".repeat(500), "author": "Author Test", "year_published": 2020, "book_type": "Non-Fiction"}),
        // Year does not fit the column
        json!({"name": "Book Test", "author": "Author Test", "year_published": 10_000_000_000_i64, "book_type": "Non-Fiction"}),
    ];

    for body in invalid_bodies {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/v1/books", &body))
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "body: {}",
            body
        );
        let error = body_json(response).await;
        assert_eq!(error["error"], "ConstraintViolation");
    }

    // Nothing was persisted.
    let response = app.oneshot(get("/api/v1/books")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_list_books_with_filters() {
    let app = test_app().await;

    for (name, author, year, book_type) in [
        ("1984", "George Orwell", 1949, "Dystopian"),
        ("Moby Dick", "Herman Melville", 1851, "Adventure"),
    ] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/books",
                &json!({
                    "name": name,
                    "author": author,
                    "year_published": year,
                    "book_type": book_type
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app.clone().oneshot(get("/api/v1/books")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);

    let response = app
        .oneshot(get("/api/v1/books?year_published=1949"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["name"], "1984");
}

#[tokio::test]
async fn test_list_books_extreme_page() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/books",
            &json!({
                "name": "The Great Gatsby",
                "author": "F. Scott Fitzgerald",
                "year_published": 1925,
                "book_type": "Fiction"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // A page number at the far end of i64 must not overflow the offset
    // computation; it is just an empty page.
    let response = app
        .oneshot(get(&format!("/api/v1/books?page={}", i64::MAX)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_update_and_delete_book() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/books",
            &json!({
                "name": "War and Peace",
                "author": "Leo Tolstoi",
                "year_published": 1869,
                "book_type": "Historical"
            }),
        ))
        .await
        .unwrap();
    let id = body_json(response).await["id"].as_i64().unwrap();

    // Fix the author spelling via full replace
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/books/{}", id),
            &json!({
                "name": "War and Peace",
                "author": "Leo Tolstoy",
                "year_published": 1869,
                "book_type": "Historical"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["author"], "Leo Tolstoy");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/v1/books/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(get(&format!("/api/v1/books/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_missing_book() {
    let app = test_app().await;

    let response = app.oneshot(get("/api/v1/books/999")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["error"], "NoSuchBook");
}
