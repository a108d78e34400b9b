//! Filament RPC - Remote access to `Rgb` resources
//!
//! - `RgbService` dispatches requests by resource name to registered instances
//! - `RgbClient` implements `Rgb` by forwarding every call over a `Channel`
//! - `LoopbackChannel` connects the two in-process
//! - `http` serves the service with axum and reaches it with reqwest

pub mod channel;
pub mod client;
pub mod http;
pub mod messages;
pub mod service;

pub use channel::{Channel, LoopbackChannel};
pub use client::RgbClient;
pub use http::{router, HttpChannel, RpcFault};
pub use messages::{
    AnimateRequest, AnimateResponse, ClearRequest, ClearResponse, FillRequest, FillResponse,
    RgbRequest, RgbResponse, StopRequest, StopResponse,
};
pub use service::RgbService;
