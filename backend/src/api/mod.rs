use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::http::HeaderValue;
use axum::routing::patch;
use axum::{Router, extract::State, http::StatusCode, routing::get};
use serde_json::{Value, json};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::error::AppError;
use crate::models::*;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/todos", get(list_todos).post(create_todo))
        .route("/api/todos/", get(list_todos).post(create_todo))
        .route(
            "/api/todos/{id}",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
        .route("/api/todos/{id}/complete", patch(toggle_complete))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    // A literal `*` cannot be combined with credentials, so echo the caller's origin instead.
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::mirror_request()
    } else {
        let values: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("ignoring invalid CORS origin: {}", origin);
                    None
                }
            })
            .collect();
        AllowOrigin::list(values)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "TODO List API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    state.store.ping().await?;
    Ok(Json(json!({ "status": "healthy" })))
}

async fn list_todos(
    State(state): State<AppState>,
    query: Result<Query<TodoFilter>, QueryRejection>,
) -> Result<Json<Vec<Todo>>, AppError> {
    let Query(filter) = query?;
    let todos = state.todo_service().list(&filter).await?;
    Ok(Json(todos))
}

async fn create_todo(
    State(state): State<AppState>,
    payload: Result<Json<NewTodoRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Todo>), AppError> {
    let Json(req) = payload?;
    req.check_shape().map_err(AppError::Unprocessable)?;

    let todo = state.todo_service().create(req).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn get_todo(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Todo>, AppError> {
    let Path(id) = id?;
    let todo = state
        .todo_service()
        .get(id)
        .await?
        .ok_or(AppError::NotFound(id))?;
    Ok(Json(todo))
}

async fn update_todo(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateTodoRequest>, JsonRejection>,
) -> Result<Json<Todo>, AppError> {
    let Path(id) = id?;
    let Json(req) = payload?;
    req.check_shape().map_err(AppError::Unprocessable)?;

    let todo = state
        .todo_service()
        .update(id, req)
        .await?
        .ok_or(AppError::NotFound(id))?;
    Ok(Json(todo))
}

async fn delete_todo(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = id?;
    let ok = state.todo_service().delete(id).await?;
    if ok {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(id))
    }
}

async fn toggle_complete(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Todo>, AppError> {
    let Path(id) = id?;
    let todo = state
        .todo_service()
        .toggle_complete(id)
        .await?
        .ok_or(AppError::NotFound(id))?;
    Ok(Json(todo))
}
