//! Request and response messages for the RGB API
//!
//! Each operation has its own request/response pair. Requests carry only the
//! short resource name; the dispatcher qualifies it with its own API.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimateRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimateResponse {
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillRequest {
    pub name: String,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillResponse {
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearResponse {
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopResponse {
    pub status: String,
}

/// Any RGB request, tagged by method name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum RgbRequest {
    Animate(AnimateRequest),
    Fill(FillRequest),
    Clear(ClearRequest),
    Stop(StopRequest),
}

impl RgbRequest {
    /// RPC method name, as used in HTTP paths
    pub fn method(&self) -> &'static str {
        match self {
            Self::Animate(_) => "Animate",
            Self::Fill(_) => "Fill",
            Self::Clear(_) => "Clear",
            Self::Stop(_) => "Stop",
        }
    }

    /// Short name of the target resource
    pub fn name(&self) -> &str {
        match self {
            Self::Animate(r) => &r.name,
            Self::Fill(r) => &r.name,
            Self::Clear(r) => &r.name,
            Self::Stop(r) => &r.name,
        }
    }
}

/// Any RGB response, tagged by method name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum RgbResponse {
    Animate(AnimateResponse),
    Fill(FillResponse),
    Clear(ClearResponse),
    Stop(StopResponse),
}

impl RgbResponse {
    pub fn method(&self) -> &'static str {
        match self {
            Self::Animate(_) => "Animate",
            Self::Fill(_) => "Fill",
            Self::Clear(_) => "Clear",
            Self::Stop(_) => "Stop",
        }
    }

    pub fn status(&self) -> &str {
        match self {
            Self::Animate(r) => &r.status,
            Self::Fill(r) => &r.status,
            Self::Clear(r) => &r.status,
            Self::Stop(r) => &r.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_shape() {
        let request = RgbRequest::Fill(FillRequest {
            name: "strip".to_string(),
            red: 255,
            green: 0,
            blue: 128,
        });

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["method"], "Fill");
        assert_eq!(json["name"], "strip");
        assert_eq!(json["blue"], 128);
        assert_eq!(request.method(), "Fill");
        assert_eq!(request.name(), "strip");
    }

    #[test]
    fn test_fill_rejects_out_of_range_channel() {
        let json = r#"{"name": "strip", "red": 256, "green": 0, "blue": 0}"#;
        assert!(serde_json::from_str::<FillRequest>(json).is_err());
    }

    #[test]
    fn test_response_status() {
        let json = r#"{"method": "Stop", "status": "Ok"}"#;
        let response: RgbResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.method(), "Stop");
        assert_eq!(response.status(), "Ok");
    }
}
