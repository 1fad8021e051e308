use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct SendRequest {
    pub to: Option<String>,
    pub message: Option<String>,
}

#[derive(Serialize)]
pub struct SendResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_error: Option<String>,
}

impl SendResponse {
    pub fn sent() -> Self {
        Self {
            success: true,
            message: "WhatsApp message sent instantly!".to_string(),
            fallback_error: None,
        }
    }

    pub fn scheduled(fallback_error: String) -> Self {
        Self {
            success: true,
            message: "WhatsApp message scheduled (instant send failed).".to_string(),
            fallback_error: Some(fallback_error),
        }
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}
