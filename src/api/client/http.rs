use crate::api::client::response::MessageResponse;
use crate::api::client::ApiClient;
use crate::api::error::Error;
use crate::api::models::{Credentials, IdValue, LoginResponse, Payment, User};
use crate::api::normalize::{
    extract_receipt_url, extract_user, normalize, normalize_login, normalize_strict, Envelope,
};
use crate::config::Config;
use crate::session::{SessionContext, SessionStore};
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

const USERS_KEY: &str = "users";
const PAYMENTS_KEY: &str = "payments";

/// REST client for the admin backend.
///
/// Attaches the session's bearer token to every request. A 401 from any endpoint
/// invalidates the session before the error is returned.
pub struct HttpClient<S> {
    client: Client,
    base_url: Url,
    session: SessionContext<S>,
    strict_payloads: bool,
}

impl<S> Clone for HttpClient<S> {
    fn clone(&self) -> Self {
        HttpClient {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            session: self.session.clone(),
            strict_payloads: self.strict_payloads,
        }
    }
}

impl<S: SessionStore + Send + 'static> HttpClient<S> {
    pub fn new(base_url: Url, timeout: Duration, session: SessionContext<S>) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;
        Ok(HttpClient {
            client,
            base_url,
            session,
            strict_payloads: true,
        })
    }

    pub fn from_config(config: &Config, session: SessionContext<S>) -> Result<Self, Error> {
        Ok(Self::new(config.api_base_url.clone(), config.request_timeout, session)?
            .with_strict_payloads(config.strict_payloads))
    }

    pub fn with_strict_payloads(mut self, strict_payloads: bool) -> Self {
        self.strict_payloads = strict_payloads;
        self
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, Error> {
        let request = match self.session.snapshot().token {
            Some(token) if !token.is_empty() => request.bearer_auth(token),
            _ => request,
        };
        let request = request.build()?;
        let method = request.method().clone();
        let path = request.url().path().to_string();

        let response = self.client.execute(request).await?;
        let status = response.status();
        debug!("{method} {path} -> {}", status.as_u16());
        let body = response.bytes().await?;

        if status == StatusCode::UNAUTHORIZED {
            self.session.invalidate();
            return Err(Error::Unauthorized(MessageResponse::from_body(&body)));
        }
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: MessageResponse::from_body(&body),
            });
        }
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        match serde_json::from_slice(&body) {
            Ok(value) => Ok(value),
            Err(e) if !self.strict_payloads => {
                warn!("{method} {path} returned a body that is not JSON: {e}");
                Ok(Value::Null)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn list<T: DeserializeOwned>(&self, payload: &Value, key: &str) -> Result<Envelope<T>, Error> {
        if self.strict_payloads {
            normalize_strict(payload, key)
        } else {
            Ok(normalize(payload, key))
        }
    }
}

impl<S: SessionStore + Send + 'static> ApiClient for HttpClient<S> {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, Error> {
        let url = self.endpoint(&["admin", "auth", "login"])?;
        let payload = self.send(self.client.post(url).json(credentials)).await?;
        normalize_login(&payload, &credentials.email)
    }

    async fn send_otp(&self, email: &str) -> Result<Option<String>, Error> {
        let url = self.endpoint(&["admin", "auth", "send-otp"])?;
        let payload = self
            .send(self.client.post(url).json(&json!({ "email": email })))
            .await?;
        Ok(payload
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    async fn get_users(&self, page: u32, limit: u32) -> Result<Envelope<User>, Error> {
        let url = self.endpoint(&["admin", "users"])?;
        let payload = self
            .send(self.client.get(url).query(&[("page", page), ("limit", limit)]))
            .await?;
        self.list(&payload, USERS_KEY)
    }

    async fn get_user(&self, id: &IdValue) -> Result<User, Error> {
        let id = id.to_string();
        let url = self.endpoint(&["admin", "users", id.as_str()])?;
        let payload = self.send(self.client.get(url)).await?;
        extract_user(&payload)
    }

    async fn get_payments(&self, page: u32, limit: u32) -> Result<Envelope<Payment>, Error> {
        let url = self.endpoint(&["payments", "all"])?;
        let payload = self
            .send(self.client.get(url).query(&[("page", page), ("limit", limit)]))
            .await?;
        self.list(&payload, PAYMENTS_KEY)
    }

    async fn get_receipt_url(&self, payment_id: u64) -> Result<String, Error> {
        let id = payment_id.to_string();
        let url = self.endpoint(&["payments", id.as_str(), "receipt"])?;
        let payload = self.send(self.client.get(url)).await?;
        extract_receipt_url(&payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Admin, PaymentStatus, Resource};
    use crate::session::SessionFile;
    use httpmock::Method::{GET, POST};
    use httpmock::MockServer;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    struct Fixture {
        server: MockServer,
        session: SessionContext<SessionFile<PathBuf>>,
        client: HttpClient<SessionFile<PathBuf>>,
        _file: NamedTempFile,
    }

    async fn fixture(token: Option<&str>) -> Fixture {
        let server = MockServer::start_async().await;
        let file = NamedTempFile::new().unwrap();
        let session = SessionContext::restore(SessionFile(file.path().to_path_buf())).unwrap();
        if let Some(token) = token {
            session
                .login(LoginResponse {
                    token: token.to_string(),
                    admin: Admin::with_email("root@example.com"),
                })
                .unwrap();
        }
        let base_url = Url::parse(&server.base_url()).unwrap();
        let client = HttpClient::new(base_url, Duration::from_secs(5), session.clone()).unwrap();
        Fixture {
            server,
            session,
            client,
            _file: file,
        }
    }

    #[tokio::test]
    async fn get_users_sends_token_and_paging() {
        let fx = fixture(Some("tok-1")).await;
        let mock = fx
            .server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/admin/users")
                    .query_param("page", "2")
                    .query_param("limit", "10")
                    .header("Authorization", "Bearer tok-1");
                then.status(200).json_body(json!({
                    "success": true,
                    "data": {"users": [{"id": 11, "name": "Ada", "is_paid": "1"}], "total": 11, "totalPages": 2}
                }));
            })
            .await;

        let envelope = fx.client.get_users(2, 10).await.unwrap();

        mock.assert_async().await;
        assert_eq!(envelope.items.len(), 1);
        assert!(envelope.items[0].is_paid());
        assert_eq!(envelope.total, Some(11));
        assert_eq!(envelope.total_pages, Some(2));
    }

    #[tokio::test]
    async fn base_path_is_kept() {
        let server = MockServer::start_async().await;
        let file = NamedTempFile::new().unwrap();
        let session = SessionContext::restore(SessionFile(file.path().to_path_buf())).unwrap();
        let base_url = Url::parse(&server.url("/api/v1/")).unwrap();
        let client = HttpClient::new(base_url, Duration::from_secs(5), session).unwrap();
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1/payments/all");
                then.status(200).json_body(json!([]));
            })
            .await;

        let envelope = client.get_payments(1, 10).await.unwrap();

        mock.assert_async().await;
        assert!(envelope.items.is_empty());
    }

    #[tokio::test]
    async fn unauthorized_response_invalidates_session() {
        let fx = fixture(Some("stale")).await;
        fx.server
            .mock_async(|when, then| {
                when.method(GET).path("/payments/all");
                then.status(401).json_body(json!({"message": "jwt expired"}));
            })
            .await;
        let mut rx = fx.session.subscribe();

        let result = fx.client.get_payments(1, 10).await;

        assert!(matches!(result, Err(Error::Unauthorized(_))));
        assert!(rx.has_changed().unwrap());
        assert!(!rx.borrow_and_update().is_authenticated());
        assert_eq!(
            SessionFile(fx._file.path()).load().unwrap(),
            crate::session::StoredSession::default()
        );
    }

    #[tokio::test]
    async fn login_normalizes_token_and_principal() {
        let fx = fixture(None).await;
        let mock = fx
            .server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/admin/auth/login")
                    .header("Content-Type", "application/json")
                    .json_body(json!({"email": "root@example.com", "password": "hunter22"}));
                then.status(200)
                    .json_body(json!({"data": {"accessToken": "tok-9", "admin": {"email": "root@example.com", "name": "Root"}}}));
            })
            .await;

        let response = fx
            .client
            .login(&Credentials::password("root@example.com", "hunter22"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.token, "tok-9");
        assert_eq!(response.admin.name.as_deref(), Some("Root"));
    }

    #[tokio::test]
    async fn rejected_login_keeps_server_message() {
        let fx = fixture(None).await;
        fx.server
            .mock_async(|when, then| {
                when.method(POST).path("/admin/auth/login");
                then.status(401).json_body(json!({"message": "Invalid email or password"}));
            })
            .await;

        let error = fx
            .client
            .login(&Credentials::password("root@example.com", "wrong-password"))
            .await
            .unwrap_err();

        assert_eq!(error.user_message(Resource::Login), "Invalid email or password");
    }

    #[tokio::test]
    async fn send_otp_posts_email() {
        let fx = fixture(None).await;
        let mock = fx
            .server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/admin/auth/send-otp")
                    .json_body(json!({"email": "root@example.com"}));
                then.status(200).json_body(json!({"message": "OTP sent"}));
            })
            .await;

        let message = fx.client.send_otp("root@example.com").await.unwrap();

        mock.assert_async().await;
        assert_eq!(message.as_deref(), Some("OTP sent"));
    }

    #[tokio::test]
    async fn server_error_message_is_extracted() {
        let fx = fixture(Some("tok")).await;
        fx.server
            .mock_async(|when, then| {
                when.method(GET).path("/admin/users/abc-123");
                then.status(500).json_body(json!({"message": "Database unavailable"}));
            })
            .await;

        let error = fx
            .client
            .get_user(&IdValue::Text("abc-123".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(&error, Error::Api { status: 500, .. }));
        assert_eq!(error.user_message(Resource::User), "Database unavailable");
        assert!(fx.session.snapshot().is_authenticated());
    }

    #[tokio::test]
    async fn unrecognized_payload_depends_on_mode() {
        let fx = fixture(Some("tok")).await;
        fx.server
            .mock_async(|when, then| {
                when.method(GET).path("/payments/all");
                then.status(200).json_body(json!({"payments": {"count": 0}}));
            })
            .await;

        let strict = fx.client.get_payments(1, 10).await;
        assert!(matches!(strict, Err(Error::UnexpectedPayload(_))));

        let lenient = fx.client.clone().with_strict_payloads(false);
        let envelope = lenient.get_payments(1, 10).await.unwrap();
        assert!(envelope.items.is_empty());
    }

    #[tokio::test]
    async fn receipt_url_and_payment_listing() {
        let fx = fixture(Some("tok")).await;
        fx.server
            .mock_async(|when, then| {
                when.method(GET).path("/payments/all");
                then.status(200).json_body(json!({"payments": [{
                    "payment_id": 7, "user_id": 3, "name": "Ada", "email": "ada@example.com",
                    "stripe_session_id": "cs_1", "amount": 999, "status": "paid",
                    "created_at": "2024-05-01T10:00:00Z"
                }]}));
            })
            .await;
        fx.server
            .mock_async(|when, then| {
                when.method(GET).path("/payments/7/receipt");
                then.status(200).json_body(json!({"success": true, "receiptUrl": "https://pay.example.com/r/7"}));
            })
            .await;

        let payments = fx.client.get_payments(1, 10).await.unwrap();
        assert_eq!(payments.items[0].status, PaymentStatus::Paid);

        let url = fx.client.get_receipt_url(payments.items[0].payment_id).await.unwrap();
        assert_eq!(url, "https://pay.example.com/r/7");
    }
}
