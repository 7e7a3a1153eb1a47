use serde::{Deserialize, Serialize};

/// Liveness payload for `/api/health`.
#[derive(Serialize, Debug)]
pub struct Health {
    pub status: &'static str,
    pub timestamp: String,
    pub uptime_secs: u64,
}

/// Response envelope shared by every endpoint:
/// `{ success, message, data?, error? }`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<serde_json::Value>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self { success: true, message: message.into(), data: Some(data), error: None }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into(), data: None, error: None }
    }

    pub fn fail(message: impl Into<String>, error: Option<serde_json::Value>) -> Self {
        Self { success: false, message: message.into(), data: None, error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_omits_absent_fields() {
        let v = serde_json::to_value(ApiResponse::message("done")).unwrap();
        assert_eq!(v, json!({"success": true, "message": "done"}));
    }

    #[test]
    fn failure_carries_error_detail() {
        let v = serde_json::to_value(ApiResponse::fail("Invalid data provided", Some(json!({"field": "email"})))).unwrap();
        assert_eq!(v["success"], json!(false));
        assert_eq!(v["error"]["field"], json!("email"));
        assert!(v.get("data").is_none());
    }
}
