//! REST API handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use filament_core::{rgb_api, Api, Model, ResourceError, ResourceName};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::state::{AppState, Change, Outcome};

/// API error response
#[derive(Serialize)]
struct ApiError {
    error: String,
}

impl ApiError {
    fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}

/// List hosted resources
pub async fn list_resources(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.manager.resources().await)
}

/// Deregister and close one resource of the RGB API
pub async fn remove_resource(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    let name = ResourceName::new(rgb_api(), &name);
    if state.manager.remove(&name).await {
        info!(resource = %name, "Resource removed over REST");
        StatusCode::NO_CONTENT.into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(ApiError::new("Resource not found")),
        )
            .into_response()
    }
}

#[derive(Serialize)]
pub struct ModelInfo {
    pub api: Api,
    pub model: Model,
}

/// List registered models
pub async fn list_models(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut models: Vec<ModelInfo> = state
        .manager
        .models()
        .models()
        .map(|(api, model)| ModelInfo {
            api: api.clone(),
            model: model.clone(),
        })
        .collect();
    models.sort_by_key(|m| m.model.to_string());
    Json(models)
}

/// Per-component result of a reload
#[derive(Serialize)]
pub struct OutcomeView {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<Change>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ResourceError>,
}

impl From<Outcome> for OutcomeView {
    fn from(outcome: Outcome) -> Self {
        let name = outcome.name.to_string();
        match outcome.result {
            Ok(change) => Self {
                name,
                change: Some(change),
                error: None,
            },
            Err(error) => Self {
                name,
                change: None,
                error: Some(error),
            },
        }
    }
}

/// Re-read the configuration file and apply it
pub async fn reload(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    info!("Reload requested over REST");
    match state.reload().await {
        Ok(outcomes) => {
            let views: Vec<OutcomeView> = outcomes.into_iter().map(OutcomeView::from).collect();
            Json(views).into_response()
        }
        Err(e) => {
            warn!(error = %e, "Reload failed");
            (
                StatusCode::BAD_REQUEST,
                Json(ApiError::new(format!("Reload failed: {:#}", e))),
            )
                .into_response()
        }
    }
}
