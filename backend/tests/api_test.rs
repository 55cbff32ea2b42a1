mod common;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use todo_backend::api::router;

async fn app() -> Router {
    router(common::test_state().await)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_whitespace_description_is_rejected() {
    let app = app().await;
    let (status, body) = send(&app, Method::POST, "/api/todos/", Some(json!({"description": "   "}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Description cannot be empty or whitespace-only");
}

#[tokio::test]
async fn test_structural_violations_are_422() {
    let app = app().await;

    let (status, _) = send(&app, Method::POST, "/api/todos/", Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(&app, Method::POST, "/api/todos/", Some(json!({"description": ""}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let long = "a".repeat(501);
    let (status, _) = send(&app, Method::POST, "/api/todos/", Some(json!({"description": long}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(&app, Method::POST, "/api/todos/", Some(json!({"description": 12}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(&app, Method::GET, "/api/todos/not-a-number", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(&app, Method::GET, "/api/todos/?completed=maybe", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_create_toggle_delete_scenario() {
    let app = app().await;

    let (status, created) = send(&app, Method::POST, "/api/todos/", Some(json!({"description": "Test"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["description"], "Test");
    assert_eq!(created["completed"], false);
    assert_eq!(created["priority"], "Medium");
    assert!(created["due_date"].is_null());
    assert!(created["category"].is_null());
    let id = created["id"].as_i64().unwrap();
    let uri = format!("/api/todos/{id}");
    let complete_uri = format!("/api/todos/{id}/complete");

    let (status, toggled) = send(&app, Method::PATCH, &complete_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["completed"], true);

    let (_, toggled) = send(&app, Method::PATCH, &complete_uri, None).await;
    assert_eq!(toggled["completed"], false);

    let (status, body) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, _) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::PATCH, &complete_uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_with_optional_fields_and_get() {
    let app = app().await;

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/todos",
        Some(json!({
            "description": "  File taxes  ",
            "priority": "High",
            "due_date": "2026-04-15T12:00:00Z",
            "category": "Finance"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["description"], "File taxes");

    let id = created["id"].as_i64().unwrap();
    let (status, fetched) = send(&app, Method::GET, &format!("/api/todos/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
    assert_eq!(fetched["priority"], "High");
    assert_eq!(fetched["category"], "Finance");
    assert!(fetched["due_date"].as_str().unwrap().starts_with("2026-04-15T12:00:00"));
}

#[tokio::test]
async fn test_update_partial_fields() {
    let app = app().await;
    let (_, created) = send(&app, Method::POST, "/api/todos/", Some(json!({"description": "Draft"}))).await;
    let uri = format!("/api/todos/{}", created["id"]);

    let (status, updated) = send(&app, Method::PUT, &uri, Some(json!({"completed": true, "category": "Work"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["description"], "Draft");
    assert_eq!(updated["completed"], true);
    assert_eq!(updated["category"], "Work");
    assert_eq!(updated["created_at"], created["created_at"]);

    let (status, _) = send(&app, Method::PUT, &uri, Some(json!({"description": "\t "}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(&app, Method::PUT, "/api/todos/9999", Some(json!({"completed": true}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // unknown id is reported before the blank description
    let (status, _) = send(&app, Method::PUT, "/api/todos/9999", Some(json!({"description": "  "}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_filters() {
    let app = app().await;
    let (_, done) = send(&app, Method::POST, "/api/todos/", Some(json!({"description": "done", "category": "Home"}))).await;
    send(&app, Method::POST, "/api/todos/", Some(json!({"description": "pending", "category": "Home"}))).await;
    send(&app, Method::PATCH, &format!("/api/todos/{}/complete", done["id"]), None).await;

    let (status, all) = send(&app, Method::GET, "/api/todos/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (_, completed) = send(&app, Method::GET, "/api/todos/?completed=true", None).await;
    let completed = completed.as_array().unwrap();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0]["id"], done["id"]);

    let (_, none) = send(&app, Method::GET, "/api/todos?completed=true&category=Work", None).await;
    assert!(none.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_root_and_health() {
    let app = app().await;

    let (status, body) = send(&app, Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "TODO List API");

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_cors_allows_configured_origin() {
    let app = app().await;
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/todos/")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:5173"
    );
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );
}
