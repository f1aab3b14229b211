use serde::{Deserialize, Serialize};

/// Session snapshot reported by the bridge. `state` is one of
/// "qr", "ready", "auth_failure", "disconnected".
#[derive(Debug, Clone, Deserialize)]
pub struct SessionStatus {
    pub state: String,

    #[serde(default)]
    pub qr: Option<String>,

    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest {
    pub to: String,
    pub body: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisteredResponse {
    pub registered: bool,
}
