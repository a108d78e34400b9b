//! Request/response channels between a client proxy and a dispatcher

use async_trait::async_trait;
use filament_core::ResourceError;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

use crate::messages::{RgbRequest, RgbResponse};
use crate::service::RgbService;

/// Carries one request to a dispatcher and returns its reply.
///
/// Implementations must allow many calls in flight at once: a long-running
/// `Animate` must never hold up a `Stop` sent after it.
#[async_trait]
pub trait Channel: Send + Sync {
    async fn call(&self, request: RgbRequest) -> Result<RgbResponse, ResourceError>;
}

type Reply = Result<RgbResponse, ResourceError>;

struct Envelope {
    payload: Vec<u8>,
    reply: oneshot::Sender<Vec<u8>>,
}

const QUEUE_DEPTH: usize = 64;

/// In-process channel backed by a server task.
///
/// Requests and replies cross the channel JSON-encoded, the same bytes an
/// HTTP body would carry, so the loopback path exercises the wire format.
#[derive(Clone)]
pub struct LoopbackChannel {
    requests: mpsc::Sender<Envelope>,
}

impl LoopbackChannel {
    /// Spawn a server task for `service` and return a channel connected to it.
    ///
    /// The task exits once every clone of the channel has been dropped.
    pub fn serve(service: Arc<RgbService>) -> Self {
        let (requests, mut rx) = mpsc::channel::<Envelope>(QUEUE_DEPTH);

        tokio::spawn(async move {
            while let Some(envelope) = rx.recv().await {
                let service = service.clone();
                tokio::spawn(async move {
                    let reply: Reply = match serde_json::from_slice::<RgbRequest>(&envelope.payload)
                    {
                        Ok(request) => service.handle(request).await,
                        Err(e) => Err(ResourceError::malformed(e.to_string())),
                    };
                    match serde_json::to_vec(&reply) {
                        Ok(bytes) => {
                            let _ = envelope.reply.send(bytes);
                        }
                        Err(e) => debug!(error = %e, "Failed to encode loopback reply"),
                    }
                });
            }
            debug!("Loopback server stopped");
        });

        Self { requests }
    }
}

#[async_trait]
impl Channel for LoopbackChannel {
    async fn call(&self, request: RgbRequest) -> Result<RgbResponse, ResourceError> {
        let payload = serde_json::to_vec(&request)
            .map_err(|e| ResourceError::malformed(e.to_string()))?;
        trace!(method = request.method(), bytes = payload.len(), "Loopback request");

        let (reply, rx) = oneshot::channel();
        self.requests
            .send(Envelope { payload, reply })
            .await
            .map_err(|_| ResourceError::transport("loopback server is not running"))?;

        let bytes = rx
            .await
            .map_err(|_| ResourceError::transport("loopback server dropped the request"))?;
        let reply: Reply = serde_json::from_slice(&bytes)
            .map_err(|e| ResourceError::transport(format!("undecodable reply: {}", e)))?;
        reply
    }
}
