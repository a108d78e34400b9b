//! HTTP transport
//!
//! Each method is served at `POST /rpc/{namespace}.{type}.{subtype}/{Method}`
//! with the per-method request as a JSON body. Success returns the response
//! message; failure returns `{"error": ResourceError}` with a status code
//! matching the error kind.

use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use filament_core::{rgb_api, Api, ResourceError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::channel::Channel;
use crate::messages::{
    AnimateRequest, ClearRequest, FillRequest, RgbRequest, RgbResponse, StopRequest,
};
use crate::service::RgbService;

/// Error body of a failed call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcFault {
    pub error: ResourceError,
}

/// HTTP status reported for each error kind
pub fn status_for(error: &ResourceError) -> StatusCode {
    match error {
        ResourceError::Configuration { .. } | ResourceError::Malformed { .. } => {
            StatusCode::BAD_REQUEST
        }
        ResourceError::NotFound { .. } | ResourceError::UnknownModel { .. } => {
            StatusCode::NOT_FOUND
        }
        ResourceError::Bus { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        ResourceError::Transport { .. } => StatusCode::BAD_GATEWAY,
    }
}

fn rpc_path(api: &Api, method: &str) -> String {
    format!("/rpc/{}/{}", api.service_path(), method)
}

/// Routes for every RGB method, bound to `service`
pub fn router(service: Arc<RgbService>) -> Router {
    let api = service.api().clone();
    Router::new()
        .route(&rpc_path(&api, "Animate"), post(animate))
        .route(&rpc_path(&api, "Fill"), post(fill))
        .route(&rpc_path(&api, "Clear"), post(clear))
        .route(&rpc_path(&api, "Stop"), post(stop))
        .with_state(service)
}

fn decode<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ResourceError> {
    body.map(|Json(request)| request)
        .map_err(|rejection| ResourceError::malformed(rejection.body_text()))
}

fn reply<T: Serialize>(result: Result<T, ResourceError>) -> Response {
    match result {
        Ok(body) => Json(body).into_response(),
        Err(error) => (status_for(&error), Json(RpcFault { error })).into_response(),
    }
}

async fn animate(
    State(service): State<Arc<RgbService>>,
    body: Result<Json<AnimateRequest>, JsonRejection>,
) -> Response {
    let result = match decode(body) {
        Ok(request) => service.animate(request).await,
        Err(e) => Err(e),
    };
    reply(result)
}

async fn fill(
    State(service): State<Arc<RgbService>>,
    body: Result<Json<FillRequest>, JsonRejection>,
) -> Response {
    let result = match decode(body) {
        Ok(request) => service.fill(request).await,
        Err(e) => Err(e),
    };
    reply(result)
}

async fn clear(
    State(service): State<Arc<RgbService>>,
    body: Result<Json<ClearRequest>, JsonRejection>,
) -> Response {
    let result = match decode(body) {
        Ok(request) => service.clear(request).await,
        Err(e) => Err(e),
    };
    reply(result)
}

async fn stop(
    State(service): State<Arc<RgbService>>,
    body: Result<Json<StopRequest>, JsonRejection>,
) -> Response {
    let result = match decode(body) {
        Ok(request) => service.stop(request).await,
        Err(e) => Err(e),
    };
    reply(result)
}

/// Client side of the HTTP transport.
///
/// No request timeout is set: `Animate` stays open until the animation is
/// stopped.
#[derive(Clone)]
pub struct HttpChannel {
    client: reqwest::Client,
    base_url: String,
    api: Api,
}

impl HttpChannel {
    /// `base_url` is the daemon root, e.g. `http://10.0.0.5:8081`
    pub fn new(base_url: &str) -> Result<Self, ResourceError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ResourceError::transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api: rgb_api(),
        })
    }

    pub fn url(&self, method: &str) -> String {
        format!("{}{}", self.base_url, rpc_path(&self.api, method))
    }
}

#[async_trait]
impl Channel for HttpChannel {
    async fn call(&self, request: RgbRequest) -> Result<RgbResponse, ResourceError> {
        let url = self.url(request.method());
        debug!(url = %url, resource = request.name(), "Sending RPC");

        let builder = self.client.post(&url);
        let builder = match &request {
            RgbRequest::Animate(r) => builder.json(r),
            RgbRequest::Fill(r) => builder.json(r),
            RgbRequest::Clear(r) => builder.json(r),
            RgbRequest::Stop(r) => builder.json(r),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| ResourceError::transport(e.to_string()))?;
        let status = response.status();

        if status.is_success() {
            let decoded = match request {
                RgbRequest::Animate(_) => response.json().await.map(RgbResponse::Animate),
                RgbRequest::Fill(_) => response.json().await.map(RgbResponse::Fill),
                RgbRequest::Clear(_) => response.json().await.map(RgbResponse::Clear),
                RgbRequest::Stop(_) => response.json().await.map(RgbResponse::Stop),
            };
            return decoded
                .map_err(|e| ResourceError::transport(format!("undecodable response: {}", e)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ResourceError::transport(e.to_string()))?;
        match serde_json::from_slice::<RpcFault>(&body) {
            Ok(fault) => Err(fault.error),
            Err(_) => {
                warn!(url = %url, status = %status, "RPC failed without an error body");
                Err(ResourceError::transport(format!("HTTP {} from {}", status, url)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use filament_core::{InstanceRegistry, ResourceName, Rgb};
    use tower::ServiceExt;

    fn empty_router() -> Router {
        let instances: Arc<InstanceRegistry<dyn Rgb>> = Arc::new(InstanceRegistry::new());
        router(Arc::new(RgbService::new(instances)))
    }

    async fn post_json(app: Router, path: &str, body: &str) -> (StatusCode, RpcFault) {
        let response = app
            .oneshot(
                Request::post(path)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&ResourceError::configuration("led_count", "must be defined")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&ResourceError::bus("short circuit")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&ResourceError::transport("reset")),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_client_url() {
        let channel = HttpChannel::new("http://127.0.0.1:8081/").unwrap();
        assert_eq!(
            channel.url("Fill"),
            "http://127.0.0.1:8081/rpc/hipsterbrown.component.rgb/Fill"
        );
    }

    #[tokio::test]
    async fn test_unknown_resource_is_404() {
        let (status, fault) = post_json(
            empty_router(),
            "/rpc/hipsterbrown.component.rgb/Stop",
            r#"{"name": "strip"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            fault.error,
            ResourceError::NotFound {
                name: ResourceName::new(rgb_api(), "strip")
            }
        );
    }

    #[tokio::test]
    async fn test_bad_body_is_malformed() {
        let (status, fault) = post_json(
            empty_router(),
            "/rpc/hipsterbrown.component.rgb/Fill",
            r#"{"name": "strip", "red": 300}"#,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(matches!(fault.error, ResourceError::Malformed { .. }));
    }
}
