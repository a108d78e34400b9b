//! Server-side dispatcher for the RGB API
//!
//! Every handler resolves the request's short name against the instance
//! registry and calls the operation of the same name on whatever is bound
//! there. Unknown names come back as `NotFound`; errors raised by the
//! resource are passed through untouched.

use filament_core::{rgb_api, Api, InstanceRegistry, ResourceError, ResourceName, Rgb};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::messages::{
    AnimateRequest, AnimateResponse, ClearRequest, ClearResponse, FillRequest, FillResponse,
    RgbRequest, RgbResponse, StopRequest, StopResponse,
};

pub struct RgbService {
    api: Api,
    instances: Arc<InstanceRegistry<dyn Rgb>>,
}

impl RgbService {
    pub fn new(instances: Arc<InstanceRegistry<dyn Rgb>>) -> Self {
        Self {
            api: rgb_api(),
            instances,
        }
    }

    pub fn api(&self) -> &Api {
        &self.api
    }

    pub fn instances(&self) -> &Arc<InstanceRegistry<dyn Rgb>> {
        &self.instances
    }

    async fn resource(&self, name: &str) -> Result<Arc<dyn Rgb>, ResourceError> {
        if name.is_empty() {
            return Err(ResourceError::malformed("request is missing a resource name"));
        }
        self.instances
            .lookup(&ResourceName::new(self.api.clone(), name))
            .await
    }

    pub async fn animate(&self, request: AnimateRequest) -> Result<AnimateResponse, ResourceError> {
        let resource = self.resource(&request.name).await?;
        let status = resource.animate().await?;
        Ok(AnimateResponse { status })
    }

    pub async fn fill(&self, request: FillRequest) -> Result<FillResponse, ResourceError> {
        let resource = self.resource(&request.name).await?;
        let status = resource
            .fill(request.red, request.green, request.blue)
            .await?;
        Ok(FillResponse { status })
    }

    pub async fn clear(&self, request: ClearRequest) -> Result<ClearResponse, ResourceError> {
        let resource = self.resource(&request.name).await?;
        let status = resource.clear().await?;
        Ok(ClearResponse { status })
    }

    pub async fn stop(&self, request: StopRequest) -> Result<StopResponse, ResourceError> {
        let resource = self.resource(&request.name).await?;
        let status = resource.stop().await?;
        Ok(StopResponse { status })
    }

    /// Dispatch any request to its handler
    pub async fn handle(&self, request: RgbRequest) -> Result<RgbResponse, ResourceError> {
        let method = request.method();
        let name = request.name().to_string();
        debug!(method, resource = %name, "Dispatching request");

        let result = match request {
            RgbRequest::Animate(r) => self.animate(r).await.map(RgbResponse::Animate),
            RgbRequest::Fill(r) => self.fill(r).await.map(RgbResponse::Fill),
            RgbRequest::Clear(r) => self.clear(r).await.map(RgbResponse::Clear),
            RgbRequest::Stop(r) => self.stop(r).await.map(RgbResponse::Stop),
        };

        if let Err(e) = &result {
            warn!(method, resource = %name, error = %e, "Request failed");
        }
        result
    }
}
