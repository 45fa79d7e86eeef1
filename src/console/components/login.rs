use crate::api::{ApiClient, Credentials, Resource};
use crate::console::components::input_dialog::{Button, InputDialog, InputField, Notice};
use crate::console::Message;
use crate::session::{SessionContext, SessionStore};
use crate::util::MpscSenderExt;
use crossterm::event::Event;
use futures::FutureExt;
use log::{error, warn};
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Stylize};
use ratatui::text::Line;
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use tokio::sync::mpsc;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum LoginField {
    Email,
    Secret,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum LoginButton {
    Login,
    SendCode,
    UsePassword,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum LoginMode {
    Password,
    Otp,
}

pub enum LoginPageMessage {
    Failed(String),
    CodeSent { email: String, message: Option<String> },
}

impl From<LoginPageMessage> for Message {
    fn from(message: LoginPageMessage) -> Self {
        Message::Login(message)
    }
}

/// Client-side checks run before anything is sent.
#[derive(Debug, Default, PartialEq)]
struct FormErrors {
    email: Option<&'static str>,
    secret: Option<&'static str>,
}

impl FormErrors {
    fn is_empty(&self) -> bool {
        self.email.is_none() && self.secret.is_none()
    }
}

/// `local@domain.tld` with no whitespace anywhere.
fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return false;
    }
    email.match_indices('@').any(|(at, _)| {
        let domain = &email[at + 1..];
        at > 0
            && domain
                .match_indices('.')
                .any(|(dot, _)| dot > 0 && dot + 1 < domain.len())
    })
}

fn validate_email(email: &str) -> Option<&'static str> {
    if email.is_empty() {
        Some("Email is required")
    } else if !is_valid_email(email) {
        Some("Enter a valid email")
    } else {
        None
    }
}

fn validate(email: &str, secret: &str, mode: LoginMode) -> FormErrors {
    let secret = match mode {
        LoginMode::Password if secret.is_empty() => Some("Password is required"),
        LoginMode::Password if secret.chars().count() < MIN_PASSWORD_LEN => {
            Some("Password must be at least 6 characters")
        }
        LoginMode::Otp if secret.is_empty() => Some("Code is required"),
        _ => None,
    };
    FormErrors {
        email: validate_email(email),
        secret,
    }
}

pub struct LoginPage<C, S> {
    dialog: InputDialog<LoginField, LoginButton>,
    mode: LoginMode,
    busy: bool,
    client: C,
    session: SessionContext<S>,
    message_tx: mpsc::Sender<Message>,
}

impl<C, S> LoginPage<C, S>
where
    C: ApiClient + Clone + Send + Sync + 'static,
    S: SessionStore + Send + 'static,
{
    pub fn new(client: C, session: SessionContext<S>, message_tx: mpsc::Sender<Message>) -> Self {
        LoginPage {
            dialog: Self::dialog(LoginMode::Password, ""),
            mode: LoginMode::Password,
            busy: false,
            client,
            session,
            message_tx,
        }
    }

    /// A login page that opens with an error, e.g. after the server dropped the session.
    pub fn with_notice(mut self, notice: &str) -> Self {
        self.dialog.set_notice(Some(Notice::Error(notice.to_string())));
        self
    }

    #[cfg(test)]
    pub fn notice(&self) -> Option<&Notice> {
        self.dialog.notice()
    }

    fn dialog(mode: LoginMode, email: &str) -> InputDialog<LoginField, LoginButton> {
        let email_field = InputField::new(LoginField::Email, "Email", email);
        match mode {
            LoginMode::Password => InputDialog::new(
                "Admin Login",
                vec![
                    email_field,
                    InputField::new(LoginField::Secret, "Password", "").masked(),
                ],
                vec![
                    Button::new(LoginButton::Login, "Login"),
                    Button::new(LoginButton::SendCode, "Send code"),
                ],
            ),
            LoginMode::Otp => InputDialog::new(
                "Admin Login",
                vec![email_field, InputField::new(LoginField::Secret, "One-time code", "")],
                vec![
                    Button::new(LoginButton::Login, "Login"),
                    Button::new(LoginButton::SendCode, "Resend code"),
                    Button::new(LoginButton::UsePassword, "Use password"),
                ],
            ),
        }
    }

    fn email(&self) -> String {
        self.dialog
            .get_value(LoginField::Email)
            .unwrap_or_default()
            .trim()
            .to_string()
    }

    fn switch_mode(&mut self, mode: LoginMode, notice: Option<Notice>) {
        let email = self.email();
        self.mode = mode;
        self.dialog = Self::dialog(mode, &email);
        self.dialog.focus(LoginField::Secret);
        self.dialog.set_notice(notice);
    }

    async fn submit(&mut self) {
        let email = self.email();
        let secret = self.dialog.get_value(LoginField::Secret).unwrap_or_default().to_string();
        let errors = validate(&email, &secret, self.mode);
        self.dialog.set_error(LoginField::Email, errors.email.map(str::to_string));
        self.dialog.set_error(LoginField::Secret, errors.secret.map(str::to_string));
        if !errors.is_empty() {
            return;
        }

        let credentials = match self.mode {
            LoginMode::Password => Credentials::password(&email, &secret),
            LoginMode::Otp => Credentials::otp(&email, &secret),
        };
        self.busy = true;
        self.dialog.set_notice(Some(Notice::Info("Signing in...".to_string())));

        let client = self.client.clone();
        let session = self.session.clone();
        let message_tx = self.message_tx.clone();
        let future = async move {
            match client.login(&credentials).await {
                Ok(response) => {
                    // Navigation follows from the session change.
                    if let Err(e) = session.login(response) {
                        error!("Failed to store session: {e:?}");
                        message_tx
                            .send_or_log(LoginPageMessage::Failed(format!("Could not store session: {e}")).into())
                            .await;
                    }
                }
                Err(e) => {
                    warn!("Login for {} failed: {e}", credentials.email);
                    message_tx
                        .send_or_log(LoginPageMessage::Failed(e.user_message(Resource::Login)).into())
                        .await;
                }
            }
        }
        .boxed();
        self.message_tx.send_or_log(Message::RunFuture(future)).await;
    }

    async fn send_code(&mut self) {
        let email = self.email();
        self.dialog.clear_errors();
        if let Some(error) = validate_email(&email) {
            self.dialog.set_error(LoginField::Email, Some(error.to_string()));
            return;
        }
        self.busy = true;
        self.dialog.set_notice(Some(Notice::Info("Sending code...".to_string())));

        let client = self.client.clone();
        let message_tx = self.message_tx.clone();
        let future = async move {
            let message = match client.send_otp(&email).await {
                Ok(message) => LoginPageMessage::CodeSent { email, message },
                Err(e) => {
                    warn!("Sending a login code to {email} failed: {e}");
                    LoginPageMessage::Failed(e.user_message(Resource::SendOtp))
                }
            };
            message_tx.send_or_log(message.into()).await;
        }
        .boxed();
        self.message_tx.send_or_log(Message::RunFuture(future)).await;
    }

    pub async fn handle_event(&mut self, event: &Event) {
        if self.busy {
            return;
        }
        match self.dialog.handle_event(event) {
            Some(LoginButton::Login) => self.submit().await,
            Some(LoginButton::SendCode) => self.send_code().await,
            Some(LoginButton::UsePassword) => self.switch_mode(LoginMode::Password, None),
            None => {}
        }
    }

    pub fn handle_message(&mut self, message: LoginPageMessage) {
        self.busy = false;
        match message {
            LoginPageMessage::Failed(text) => self.dialog.set_notice(Some(Notice::Error(text))),
            LoginPageMessage::CodeSent { email, message } => {
                let text = message.unwrap_or_else(|| format!("A login code was sent to {email}."));
                self.switch_mode(LoginMode::Otp, Some(Notice::Info(text)));
            }
        }
    }

    pub fn view(&self, frame: &mut Frame, area: Rect) {
        let [header_area, dialog_area] =
            Layout::vertical([Constraint::Length(3), Constraint::Fill(1)]).areas(area);
        let header = Paragraph::new(vec![
            Line::from("paydesk").bold().light_blue(),
            Line::from("Sign in to access the dashboard").fg(Color::Gray),
        ])
        .alignment(Alignment::Center);
        frame.render_widget(header, header_area);
        self.dialog.view(frame, dialog_area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Admin, Error, LoginResponse, MockApiClient};
    use crate::event_ext::key;
    use crate::session::MockSessionStore;
    use crossterm::event::KeyCode;
    use mockall::predicate::eq;
    use std::sync::Arc;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("admin@example.com"));
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("a@b@c.d"));
        assert!(!is_valid_email("admin@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("admin@.com"));
        assert!(!is_valid_email("admin@example."));
        assert!(!is_valid_email("ad min@example.com"));
    }

    #[test]
    fn password_rules() {
        assert_eq!(
            validate("", "", LoginMode::Password),
            FormErrors {
                email: Some("Email is required"),
                secret: Some("Password is required"),
            }
        );
        assert_eq!(
            validate("a@b.co", "12345", LoginMode::Password).secret,
            Some("Password must be at least 6 characters")
        );
        assert!(validate("a@b.co", "123456", LoginMode::Password).is_empty());
        assert!(validate("a@b.co", "42", LoginMode::Otp).is_empty());
    }

    fn session() -> SessionContext<MockSessionStore> {
        let mut store = MockSessionStore::new();
        store.expect_load().returning(|| Ok(Default::default()));
        store.expect_save().returning(|_, _| Ok(()));
        SessionContext::restore(store).unwrap()
    }

    async fn type_text(page: &mut LoginPage<Arc<MockApiClient>, MockSessionStore>, text: &str) {
        for c in text.chars() {
            page.handle_event(&key(KeyCode::Char(c))).await;
        }
    }

    async fn run_queued(page: &mut LoginPage<Arc<MockApiClient>, MockSessionStore>, rx: &mut mpsc::Receiver<Message>) {
        while let Ok(message) = rx.try_recv() {
            match message {
                Message::RunFuture(future) => future.await,
                Message::Login(message) => page.handle_message(message),
                _ => {}
            }
        }
    }

    #[tokio::test]
    async fn invalid_form_sends_nothing() {
        let mut client = MockApiClient::new();
        client.expect_login().never();
        let (tx, mut rx) = mpsc::channel(8);
        let mut page = LoginPage::new(Arc::new(client), session(), tx);

        type_text(&mut page, "not-an-email").await;
        page.handle_event(&key(KeyCode::Enter)).await;
        type_text(&mut page, "123").await;
        page.handle_event(&key(KeyCode::Enter)).await;

        assert!(!page.busy);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn successful_login_updates_session() {
        let mut client = MockApiClient::new();
        client
            .expect_login()
            .with(eq(Credentials::password("root@example.com", "secret1")))
            .times(1)
            .returning(|_| {
                async {
                    Ok(LoginResponse {
                        token: "tok".to_string(),
                        admin: Admin::with_email("root@example.com"),
                    })
                }
                .boxed()
            });
        let session = session();
        let watcher = session.subscribe();
        let (tx, mut rx) = mpsc::channel(8);
        let mut page = LoginPage::new(Arc::new(client), session.clone(), tx);

        type_text(&mut page, "root@example.com").await;
        page.handle_event(&key(KeyCode::Enter)).await;
        type_text(&mut page, "secret1").await;
        page.handle_event(&key(KeyCode::Enter)).await;
        assert!(page.busy);
        run_queued(&mut page, &mut rx).await;

        assert!(watcher.has_changed().unwrap());
        assert!(session.snapshot().is_authenticated());
    }

    #[tokio::test]
    async fn rejected_login_shows_server_message() {
        let mut client = MockApiClient::new();
        client.expect_login().returning(|_| {
            async {
                Err(Error::Api {
                    status: 400,
                    message: Some("Invalid email or password".to_string()),
                })
            }
            .boxed()
        });
        let (tx, mut rx) = mpsc::channel(8);
        let mut page = LoginPage::new(Arc::new(client), session(), tx);

        type_text(&mut page, "root@example.com").await;
        page.handle_event(&key(KeyCode::Enter)).await;
        type_text(&mut page, "secret1").await;
        page.handle_event(&key(KeyCode::Enter)).await;
        run_queued(&mut page, &mut rx).await;

        assert!(!page.busy);
        assert!(matches!(
            page.dialog.notice(),
            Some(Notice::Error(text)) if text == "Invalid email or password"
        ));
    }

    #[tokio::test]
    async fn sending_a_code_switches_to_otp_mode() {
        let mut client = MockApiClient::new();
        client
            .expect_send_otp()
            .with(eq("root@example.com"))
            .times(1)
            .returning(|_| async { Ok(None) }.boxed());
        client
            .expect_login()
            .with(eq(Credentials::otp("root@example.com", "123456")))
            .times(1)
            .returning(|_| {
                async {
                    Ok(LoginResponse {
                        token: "tok".to_string(),
                        admin: Admin::with_email("root@example.com"),
                    })
                }
                .boxed()
            });
        let session = session();
        let (tx, mut rx) = mpsc::channel(8);
        let mut page = LoginPage::new(Arc::new(client), session.clone(), tx);

        type_text(&mut page, "root@example.com").await;
        page.handle_event(&key(KeyCode::Tab)).await;
        page.handle_event(&key(KeyCode::Tab)).await;
        page.handle_event(&key(KeyCode::Right)).await;
        page.handle_event(&key(KeyCode::Enter)).await;
        run_queued(&mut page, &mut rx).await;

        assert_eq!(page.mode, LoginMode::Otp);
        assert_eq!(page.email(), "root@example.com");
        assert!(matches!(
            page.dialog.notice(),
            Some(Notice::Info(text)) if text == "A login code was sent to root@example.com."
        ));

        type_text(&mut page, "123456").await;
        page.handle_event(&key(KeyCode::Enter)).await;
        run_queued(&mut page, &mut rx).await;
        assert!(session.snapshot().is_authenticated());
    }
}
