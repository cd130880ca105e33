//! HTTP adapter for the to-do mediator.
//!
//! # Design
//! Each route builds one request value and sends it through the shared
//! `Mediator`; no route touches the store directly. Errors come back as
//! `ApiError` and render as problem documents, including extractor
//! rejections and requests that match no route.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use todo_core::{
    CreateToDoItem, Created, DeleteToDoItem, GetToDoItem, GetToDoItems, Mediator, ResponseCache,
    ToDoId, ToDoItemDto, ToDoStore, UpdateToDoItem,
};

pub mod config;
pub mod extract;
pub mod problem;
pub mod telemetry;

pub use problem::{ApiError, ProblemDetails};

use config::Config;
use extract::{ApiJson, ApiPath};

#[derive(Clone, Debug)]
pub struct AppState {
    mediator: Arc<Mediator>,
}

impl AppState {
    pub fn new(mediator: Mediator) -> Self {
        Self {
            mediator: Arc::new(mediator),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let store = if config.seed_sample_data {
            ToDoStore::with_sample_items()
        } else {
            ToDoStore::new()
        };
        Self::new(Mediator::for_store(
            Arc::new(store),
            Arc::new(ResponseCache::new()),
            config.pipeline(),
        ))
    }

    pub fn mediator(&self) -> &Mediator {
        &self.mediator
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/todo", get(list_items).post(create_item))
        .route(
            "/api/todo/{id}",
            get(get_item).put(update_item).delete(delete_item),
        )
        .fallback(route_not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, app(state)).await
}

async fn list_items(State(state): State<AppState>) -> Result<Json<Vec<ToDoItemDto>>, ApiError> {
    Ok(Json(state.mediator.send(GetToDoItems).await?))
}

async fn get_item(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ToDoId>,
) -> Result<Json<ToDoItemDto>, ApiError> {
    state
        .mediator
        .send(GetToDoItem { id })
        .await?
        .map(Json)
        .ok_or(ApiError::ItemNotFound)
}

async fn create_item(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateToDoItem>,
) -> Result<Json<Created>, ApiError> {
    Ok(Json(state.mediator.send(request).await?))
}

async fn update_item(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ToDoId>,
    ApiJson(request): ApiJson<UpdateToDoItem>,
) -> Result<StatusCode, ApiError> {
    if id != request.id {
        return Err(ApiError::IdMismatch {
            path: id,
            body: request.id,
        });
    }
    state.mediator.send(request).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_item(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ToDoId>,
) -> Result<StatusCode, ApiError> {
    state.mediator.send(DeleteToDoItem { id }).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn route_not_found() -> ApiError {
    ApiError::RouteNotFound
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unseeded_state_is_empty() {
        let state = AppState::from_config(&Config::default());
        let items = state.mediator().send(GetToDoItems).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn seeded_state_lists_five_items() {
        let config = Config {
            seed_sample_data: true,
            ..Config::default()
        };
        let state = AppState::from_config(&config);
        let items = state.mediator().send(GetToDoItems).await.unwrap();
        assert_eq!(items.len(), 5);
    }
}
