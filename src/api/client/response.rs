use serde::Deserialize;

#[derive(Deserialize, Debug, Default)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

impl MessageResponse {
    /// The `message` field of a response body; bodies that are not JSON objects carry none.
    pub fn from_body(body: &[u8]) -> Option<String> {
        serde_json::from_slice::<MessageResponse>(body)
            .ok()
            .and_then(|r| r.message)
            .filter(|m| !m.trim().is_empty())
    }
}
