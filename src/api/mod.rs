mod client;
mod error;
mod models;
mod normalize;

pub use client::http::HttpClient;
pub use client::ApiClient;
#[cfg(test)]
pub use client::MockApiClient;
pub use error::{Error, Resource, SESSION_EXPIRED};
#[cfg(test)]
pub use models::PaidFlag;
pub use models::{format_timestamp, Admin, Credentials, IdValue, LoginResponse, Payment, PaymentStatus, User};
pub use normalize::Envelope;
