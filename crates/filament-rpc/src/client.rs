//! Client-side proxy implementing `Rgb` over a channel

use async_trait::async_trait;
use filament_core::{ResourceError, Rgb};
use std::sync::Arc;

use crate::channel::Channel;
use crate::messages::{
    AnimateRequest, ClearRequest, FillRequest, RgbRequest, RgbResponse, StopRequest,
};

/// Remote handle to a named RGB resource.
///
/// Interchangeable with a local driver: results and errors come back exactly
/// as the remote instance produced them.
pub struct RgbClient {
    name: String,
    channel: Arc<dyn Channel>,
}

impl RgbClient {
    pub fn new(name: &str, channel: Arc<dyn Channel>) -> Self {
        Self {
            name: name.to_string(),
            channel,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    async fn call(&self, request: RgbRequest) -> Result<String, ResourceError> {
        let expected = request.method();
        let response = self.channel.call(request).await?;
        if response.method() != expected {
            return Err(ResourceError::malformed(format!(
                "expected a {} response, got {}",
                expected,
                response.method()
            )));
        }
        Ok(match response {
            RgbResponse::Animate(r) => r.status,
            RgbResponse::Fill(r) => r.status,
            RgbResponse::Clear(r) => r.status,
            RgbResponse::Stop(r) => r.status,
        })
    }
}

#[async_trait]
impl Rgb for RgbClient {
    async fn animate(&self) -> Result<String, ResourceError> {
        self.call(RgbRequest::Animate(AnimateRequest {
            name: self.name.clone(),
        }))
        .await
    }

    async fn fill(&self, red: u8, green: u8, blue: u8) -> Result<String, ResourceError> {
        self.call(RgbRequest::Fill(FillRequest {
            name: self.name.clone(),
            red,
            green,
            blue,
        }))
        .await
    }

    async fn clear(&self) -> Result<String, ResourceError> {
        self.call(RgbRequest::Clear(ClearRequest {
            name: self.name.clone(),
        }))
        .await
    }

    async fn stop(&self) -> Result<String, ResourceError> {
        self.call(RgbRequest::Stop(StopRequest {
            name: self.name.clone(),
        }))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{FillResponse, StopResponse};
    use std::sync::Mutex;

    /// Records requests and answers from a script
    struct Scripted {
        seen: Mutex<Vec<RgbRequest>>,
        answer: RgbResponse,
    }

    #[async_trait]
    impl Channel for Scripted {
        async fn call(&self, request: RgbRequest) -> Result<RgbResponse, ResourceError> {
            self.seen.lock().unwrap().push(request);
            Ok(self.answer.clone())
        }
    }

    fn scripted(answer: RgbResponse) -> Arc<Scripted> {
        Arc::new(Scripted {
            seen: Mutex::new(Vec::new()),
            answer,
        })
    }

    #[tokio::test]
    async fn test_fill_sends_name_and_channels() {
        let channel = scripted(RgbResponse::Fill(FillResponse {
            status: "Ok".to_string(),
        }));
        let client = RgbClient::new("strip", channel.clone());

        assert_eq!(client.fill(255, 0, 64).await.unwrap(), "Ok");

        let seen = channel.seen.lock().unwrap();
        assert_eq!(
            seen.as_slice(),
            &[RgbRequest::Fill(FillRequest {
                name: "strip".to_string(),
                red: 255,
                green: 0,
                blue: 64,
            })]
        );
    }

    #[tokio::test]
    async fn test_mismatched_response_is_malformed() {
        let channel = scripted(RgbResponse::Stop(StopResponse {
            status: "Ok".to_string(),
        }));
        let client = RgbClient::new("strip", channel);

        let err = client.clear().await.unwrap_err();
        assert!(matches!(err, ResourceError::Malformed { .. }));
    }
}
