use thiserror::Error;

pub const SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";

/// The endpoint family an error came from, used to pick the fallback text.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Resource {
    Login,
    SendOtp,
    Users,
    User,
    Payments,
    Receipt,
}

impl Resource {
    /// Requests made before a session exists; a 401 there means bad credentials.
    pub fn is_pre_auth(&self) -> bool {
        matches!(self, Resource::Login | Resource::SendOtp)
    }

    pub fn fallback_message(&self) -> &'static str {
        match self {
            Resource::Login => "Login failed. Please try again.",
            Resource::SendOtp => "Failed to send code.",
            Resource::Users => "Failed to load users.",
            Resource::User => "Failed to load user.",
            Resource::Payments => "Failed to load payments.",
            Resource::Receipt => "Failed to load receipt.",
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("An error occurred while talking to the server: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("The server rejected the credentials")]
    Unauthorized(Option<String>),
    #[error("server returned {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Api {
        status: u16,
        message: Option<String>,
    },
    #[error("Unexpected response from server: {0}")]
    UnexpectedPayload(String),
    #[error("Authentication token not found in response")]
    MissingToken,
    #[error("An error occurred while parsing JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid request url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Text shown next to the control that triggered the failing request.
    pub fn user_message(&self, resource: Resource) -> String {
        match self {
            Error::Api {
                message: Some(message),
                ..
            } => message.clone(),
            Error::Unauthorized(Some(message)) if resource.is_pre_auth() => message.clone(),
            Error::Unauthorized(_) if !resource.is_pre_auth() => SESSION_EXPIRED.to_string(),
            Error::MissingToken if resource == Resource::Login => self.to_string(),
            _ => resource.fallback_message().to_string(),
        }
    }
}
