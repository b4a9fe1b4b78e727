//! List Routes
//!
//! Tracked identifier lists and their synchronized views.
//!
//! - GET /api/v1/lists - Registered lists
//! - GET /api/v1/lists/:namespace - Synchronize and return the view
//! - GET /api/v1/lists/:namespace/view/latest - Last published view
//! - POST /api/v1/lists/:namespace - Add an identifier
//! - DELETE /api/v1/lists/:namespace/:id - Remove an identifier

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{AddIdentifierRequest, ListInfo, ListsResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::services;
use crate::sync::SyncView;

/// GET /api/v1/lists
pub async fn list_namespaces(State(state): State<Arc<AppState>>) -> ApiResult<Json<ListsResponse>> {
    let mut lists = Vec::new();
    for namespace in state.sync.namespaces() {
        let key = namespace.key.as_str();
        lists.push(ListInfo {
            key: key.to_string(),
            kind: namespace.kind.as_str().to_string(),
            client: state.sync.client_name(key)?.to_string(),
            count: state.sync.list(key).await?.len(),
        });
    }

    Ok(Json(ListsResponse {
        total: lists.len(),
        lists,
    }))
}

/// GET /api/v1/lists/:namespace
///
/// Fetches enrichment for the whole list on every call.
pub async fn view_list(
    State(state): State<Arc<AppState>>,
    Path(namespace): Path<String>,
) -> ApiResult<Json<SyncView>> {
    Ok(Json(state.sync.view(&namespace).await?))
}

/// GET /api/v1/lists/:namespace/view/latest
pub async fn latest_view(
    State(state): State<Arc<AppState>>,
    Path(namespace): Path<String>,
) -> ApiResult<Json<SyncView>> {
    state
        .sync
        .latest(&namespace)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No view of '{}' yet", namespace)))
}

/// POST /api/v1/lists/:namespace
pub async fn add_identifier(
    State(state): State<Arc<AppState>>,
    Path(namespace): Path<String>,
    Json(request): Json<AddIdentifierRequest>,
) -> ApiResult<(StatusCode, Json<SyncView>)> {
    let view = state.sync.add_and_refresh(&namespace, &request.id).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// DELETE /api/v1/lists/:namespace/:id
///
/// Removing a coin from the portfolio also drops its holding.
pub async fn remove_identifier(
    State(state): State<Arc<AppState>>,
    Path((namespace, id)): Path<(String, String)>,
) -> ApiResult<Json<SyncView>> {
    let view = services::remove_tracked(&state.sync, &state.holdings, &namespace, &id).await?;
    Ok(Json(view))
}
