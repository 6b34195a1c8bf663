use axum::{
    body::Body,
    http::{self, Request, StatusCode},
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use library_app::books::{self, BookStore, BooksModule};
use library_kernel::settings::{DatabaseSettings, Settings};
use library_kernel::Module;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn books_router() -> Router {
    let pool = library_db::connect(&DatabaseSettings::in_memory())
        .await
        .unwrap();
    let migrations: Vec<_> = books::migrations()
        .into_iter()
        .map(|migration| ("books".to_string(), migration))
        .collect();
    library_db::run_migrations(&pool, &migrations).await.unwrap();
    BooksModule::new(BookStore::new(pool)).routes()
}

async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: Response) -> axum::body::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

// --- scenario ---

#[tokio::test]
async fn dune_lifecycle() {
    let app = books_router().await;

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/",
            r#"{"title":"Dune","author":"Herbert"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = body_json(resp).await;
    assert_eq!(created["title"], "Dune");
    assert_eq!(created["author"], "Herbert");
    assert_eq!(created["created_at"], created["updated_at"]);
    let id = created["id"].as_i64().unwrap();
    let item = format!("/{id}/");

    let resp = app.clone().oneshot(empty_request("GET", &item)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched = body_json(resp).await;
    assert_eq!(fetched, created);

    let resp = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &item,
            r#"{"title":"Dune","author":"Frank Herbert"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated = body_json(resp).await;
    assert_eq!(updated["id"], id);
    assert_eq!(updated["author"], "Frank Herbert");
    assert_eq!(updated["created_at"], created["created_at"]);

    let resp = app.clone().oneshot(empty_request("DELETE", &item)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    let resp = app.oneshot(empty_request("GET", &item)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["code"], "not_found");
}

// --- list ---

#[tokio::test]
async fn list_starts_empty() {
    let app = books_router().await;
    let resp = app.oneshot(empty_request("GET", "/")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!([]));
}

#[tokio::test]
async fn list_returns_every_created_book() {
    let app = books_router().await;
    for title in ["A", "B", "C"] {
        let resp = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/",
                &json!({"title": title, "author": "Anon"}).to_string(),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let resp = app.oneshot(empty_request("GET", "/")).await.unwrap();
    let books = body_json(resp).await;
    let titles: Vec<&str> = books
        .as_array()
        .unwrap()
        .iter()
        .map(|book| book["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["A", "B", "C"]);
}

// --- create ---

#[tokio::test]
async fn create_reports_field_errors() {
    let app = books_router().await;
    let resp = app
        .oneshot(json_request(
            "POST",
            "/",
            &json!({"title": "x".repeat(101)}).to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["code"], "validation_error");
    assert_eq!(
        body["error"]["details"],
        json!([
            {"field": "title", "code": "max_length", "message": "Ensure this field has no more than 100 characters."},
            {"field": "author", "code": "required", "message": "This field is required."}
        ])
    );
}

#[tokio::test]
async fn create_with_empty_body_requires_every_field() {
    let app = books_router().await;
    let resp = app.oneshot(empty_request("POST", "/")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    let fields: Vec<&str> = body["error"]["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|detail| detail["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["title", "author"]);
}

#[tokio::test]
async fn create_malformed_json_returns_400() {
    let app = books_router().await;
    let resp = app
        .oneshot(json_request("POST", "/", r#"{"title": "Dune""#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"]["code"], "bad_request");
}

// --- item ---

#[tokio::test]
async fn update_with_missing_field_keeps_stored_values() {
    let app = books_router().await;
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/", r#"{"title":"Emma","author":"Austen"}"#))
        .await
        .unwrap();
    let created = body_json(resp).await;
    let item = format!("/{}/", created["id"]);

    let resp = app
        .clone()
        .oneshot(json_request("PATCH", &item, r#"{"title":"Persuasion"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app.oneshot(empty_request("GET", &item)).await.unwrap();
    let fetched = body_json(resp).await;
    assert_eq!(fetched["title"], "Emma");
    assert_eq!(fetched["author"], "Austen");
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let app = books_router().await;

    for request in [
        empty_request("GET", "/41/"),
        json_request("PATCH", "/41/", r#"{"title":"Dune","author":"Herbert"}"#),
        empty_request("DELETE", "/41/"),
        empty_request("GET", "/dune/"),
        empty_request("GET", "/-1/"),
    ] {
        let resp = app.clone().oneshot(request).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn unmapped_verbs_are_method_not_allowed() {
    let app = books_router().await;

    for request in [
        empty_request("DELETE", "/"),
        json_request("PUT", "/1/", r#"{"title":"Dune","author":"Herbert"}"#),
        empty_request("POST", "/1/"),
    ] {
        let resp = app.clone().oneshot(request).await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}

// --- full application ---

async fn application() -> Router {
    let pool = library_db::connect(&DatabaseSettings::in_memory())
        .await
        .unwrap();
    let registry = library_app::modules::register_all(&pool);
    library_db::run_migrations(&pool, &registry.collect_migrations())
        .await
        .unwrap();
    library_http::build_router(&registry, &Settings::default())
}

#[tokio::test]
async fn application_serves_collection_and_items_under_api_books() {
    let app = application().await;

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/books/",
            r#"{"title":"Dune","author":"Herbert"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert!(resp.headers().contains_key("x-request-id"));
    let created = body_json(resp).await;
    let item = format!("/api/books/{}/", created["id"]);

    let resp = app
        .clone()
        .oneshot(empty_request("GET", "/api/books/"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!([created.clone()]));

    let resp = app.clone().oneshot(empty_request("GET", &item)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, created);

    let resp = app
        .clone()
        .oneshot(empty_request("DELETE", &item))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app.oneshot(empty_request("GET", &item)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn application_collection_requires_trailing_slash() {
    let app = application().await;

    let resp = app.oneshot(empty_request("GET", "/api/books")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn application_documents_mounted_paths() {
    let app = application().await;

    let resp = app
        .oneshot(empty_request("GET", "/docs/openapi.json"))
        .await
        .unwrap();
    let spec = body_json(resp).await;
    assert!(spec["paths"]["/api/books/"]["post"].is_object());
    assert!(spec["paths"]["/api/books/{id}/"]["patch"].is_object());
    assert!(spec["components"]["schemas"]["Book"].is_object());
}
