//! API DTOs (Data Transfer Objects)

use serde::Serialize;

/// Body returned when a client exhausted its window
#[derive(Debug, Clone, Serialize)]
pub struct BlockedResponse {
    #[serde(rename = "Msg")]
    pub msg: String,
    #[serde(rename = "Status")]
    pub status: u16,
}

impl BlockedResponse {
    pub const MESSAGE: &'static str = "Blocked too many calls";

    pub fn too_many_calls() -> Self {
        Self {
            msg: Self::MESSAGE.to_string(),
            status: 429,
        }
    }
}

/// Response for GET /health
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_response_serialization() {
        let json = serde_json::to_value(BlockedResponse::too_many_calls()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"Msg": "Blocked too many calls", "Status": 429})
        );
    }
}
