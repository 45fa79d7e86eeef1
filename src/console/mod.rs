//! The terminal admin console: page routing, alerts and the reaction to session changes.

pub mod components;
mod widgets;

use crate::api::{ApiClient, SESSION_EXPIRED};
use crate::appframework::Application;
use crate::console::components::home::HomePage;
use crate::console::components::login::{LoginPage, LoginPageMessage};
use crate::console::components::navigation_input::NavigationInput;
use crate::console::components::table::payments::{PaymentsPage, PaymentsPageMessage};
use crate::console::components::table::users::{UsersPage, UsersPageMessage};
use crate::console::widgets::Alert;
use crate::event_ext::EventExt;
use crate::session::{SessionContext, SessionSnapshot, SessionStore};
use crate::util::clipboard::ClipboardAccess;
use crate::util::MpscSenderExt;
use crossterm::event::Event;
use futures::future::BoxFuture;
use log::{error, info};
use ratatui::layout::{Constraint, Layout};
use ratatui::Frame;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Route {
    Home,
    Users,
    Payments,
}

pub enum Message {
    RunFuture(BoxFuture<'static, ()>),
    Navigate(Route),
    Logout,
    Quit,
    ShowAlert(String, String),
    CopyToClipboard { title: String, text: String },
    SessionChanged(SessionSnapshot),
    Login(LoginPageMessage),
    Users(UsersPageMessage),
    Payments(PaymentsPageMessage),
}

impl Message {
    pub fn alert<T: Into<String>, M: Into<String>>(title: T, message: M) -> Message {
        Message::ShowAlert(title.into(), message.into())
    }
}

pub enum Page<C: ApiClient + Clone + Send + Sync + 'static, S> {
    Login(LoginPage<C, S>),
    Home(HomePage),
    Users(UsersPage<C>),
    Payments(PaymentsPage<C>),
}

pub struct AdminConsole<C, S, K>
where
    C: ApiClient + Clone + Send + Sync + 'static,
{
    page: Page<C, S>,
    api_client: C,
    session: SessionContext<S>,
    clipboard: K,
    page_size: u32,
    alert: Option<(String, String)>,
    navigation: Option<NavigationInput>,
    message_tx: mpsc::Sender<Message>,
    session_watch: CancellationToken,
    is_finished: bool,
}

/// Forwards session changes into the console's message queue until cancelled.
fn watch_session(
    mut session_rx: watch::Receiver<SessionSnapshot>,
    message_tx: mpsc::Sender<Message>,
    cancellation_token: CancellationToken,
) {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                changed = session_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = session_rx.borrow_and_update().clone();
                    if message_tx.send(Message::SessionChanged(snapshot)).await.is_err() {
                        break;
                    }
                }
                _ = cancellation_token.cancelled() => break,
            }
        }
    });
}

impl<C, S, K> AdminConsole<C, S, K>
where
    C: ApiClient + Clone + Send + Sync + 'static,
    S: SessionStore + Send + 'static,
    K: ClipboardAccess,
{
    pub async fn new(
        api_client: C,
        session: SessionContext<S>,
        clipboard: K,
        page_size: u32,
        message_tx: mpsc::Sender<Message>,
    ) -> Self {
        let session_watch = CancellationToken::new();
        watch_session(session.subscribe(), message_tx.clone(), session_watch.clone());

        let snapshot = session.snapshot();
        let page = if snapshot.is_authenticated() {
            Page::Home(HomePage::new(snapshot.display_name()))
        } else {
            Page::Login(LoginPage::new(api_client.clone(), session.clone(), message_tx.clone()))
        };

        AdminConsole {
            page,
            api_client,
            session,
            clipboard,
            page_size,
            alert: None,
            navigation: None,
            message_tx,
            session_watch,
            is_finished: false,
        }
    }

    fn show_login(&mut self, notice: Option<&str>) {
        self.navigation = None;
        let page = LoginPage::new(self.api_client.clone(), self.session.clone(), self.message_tx.clone());
        self.page = Page::Login(match notice {
            Some(notice) => page.with_notice(notice),
            None => page,
        });
    }

    async fn navigate(&mut self, route: Route) {
        let snapshot = self.session.snapshot();
        if !snapshot.is_authenticated() {
            self.show_login(None);
            return;
        }
        self.page = match route {
            Route::Home => Page::Home(HomePage::new(snapshot.display_name())),
            Route::Users => Page::Users(
                UsersPage::new(self.api_client.clone(), self.page_size, self.message_tx.clone()).await,
            ),
            Route::Payments => Page::Payments(
                PaymentsPage::new(self.api_client.clone(), self.page_size, self.message_tx.clone()).await,
            ),
        };
    }

    async fn handle_session_changed(&mut self, snapshot: SessionSnapshot) {
        let on_login = matches!(self.page, Page::Login(_));
        match (on_login, snapshot.is_authenticated()) {
            (true, true) => self.navigate(Route::Home).await,
            (true, false) | (false, true) => {}
            (false, false) => {
                info!("Session ended, returning to login");
                self.alert = None;
                self.show_login(Some(SESSION_EXPIRED));
            }
        }
    }

    fn logout(&mut self) {
        if let Err(e) = self.session.logout() {
            error!("Failed to clear stored session: {e:?}");
        }
        self.show_login(None);
    }

    fn copy_to_clipboard(&mut self, title: String, text: String) {
        let message = match self.clipboard.copy(&text) {
            Ok(()) => format!("Copied to clipboard:\n{text}"),
            Err(e) => format!("{text}\n\nClipboard unavailable: {e}"),
        };
        self.alert = Some((title, message));
    }

    fn is_text_input_active(&self) -> bool {
        match &self.page {
            Page::Login(_) => true,
            Page::Users(page) => page.is_capturing_input(),
            Page::Payments(page) => page.is_capturing_input(),
            Page::Home(_) => false,
        }
    }
}

impl<C, S, K> Application for AdminConsole<C, S, K>
where
    C: ApiClient + Clone + Send + Sync + 'static,
    S: SessionStore + Send + 'static,
    K: ClipboardAccess,
{
    type Message = Message;

    fn view(&self, frame: &mut Frame) {
        let area = frame.area();
        let (page_area, navigation_area) = if self.navigation.is_some() {
            let [navigation_area, page_area] =
                Layout::vertical([Constraint::Length(3), Constraint::Fill(1)]).areas(area);
            (page_area, Some(navigation_area))
        } else {
            (area, None)
        };

        match &self.page {
            Page::Login(page) => page.view(frame, page_area),
            Page::Home(page) => page.view(frame, page_area),
            Page::Users(page) => page.view(frame, page_area),
            Page::Payments(page) => page.view(frame, page_area),
        }

        if let (Some(navigation), Some(navigation_area)) = (&self.navigation, navigation_area) {
            navigation.view(frame, navigation_area);
        }

        if let Some((title, message)) = &self.alert {
            frame.render_widget(Alert::new(title, message), area);
        }
    }

    async fn handle_event(&mut self, event: &Event) {
        if event.is_stop() {
            self.is_finished = true;
            return;
        }

        if self.alert.is_some() {
            if event.is_enter() || event.is_esc() {
                self.alert = None;
            }
            return;
        }

        if let Some(navigation) = &mut self.navigation {
            if navigation.handle_event(event).await {
                self.navigation = None;
            }
            return;
        }

        if event.is_char(':') && !self.is_text_input_active() {
            self.navigation = Some(NavigationInput::new(self.message_tx.clone()));
            return;
        }

        match &mut self.page {
            Page::Login(page) => page.handle_event(event).await,
            Page::Home(page) => {
                if let Some(message) = page.handle_event(event) {
                    self.message_tx.send_or_log(message).await;
                }
            }
            Page::Users(page) => {
                if !page.handle_event(event).await && event.is_esc() {
                    self.navigate(Route::Home).await;
                }
            }
            Page::Payments(page) => {
                if !page.handle_event(event).await && event.is_esc() {
                    self.navigate(Route::Home).await;
                }
            }
        }
    }

    async fn handle_message(&mut self, message: Message) {
        match message {
            Message::RunFuture(future) => {
                tokio::spawn(future);
            }
            Message::Navigate(route) => self.navigate(route).await,
            Message::Logout => self.logout(),
            Message::Quit => self.is_finished = true,
            Message::ShowAlert(title, message) => self.alert = Some((title, message)),
            Message::CopyToClipboard { title, text } => self.copy_to_clipboard(title, text),
            Message::SessionChanged(snapshot) => self.handle_session_changed(snapshot).await,
            Message::Login(message) => {
                if let Page::Login(page) = &mut self.page {
                    page.handle_message(message);
                }
            }
            // Results for a page that has since been left are dropped here.
            Message::Users(message) => {
                if let Page::Users(page) = &mut self.page {
                    page.handle_message(message);
                }
            }
            Message::Payments(message) => {
                if let Page::Payments(page) = &mut self.page {
                    page.handle_message(message);
                }
            }
        }
    }

    fn is_finished(&self) -> bool {
        self.is_finished
    }
}

impl<C: ApiClient + Clone + Send + Sync + 'static, S, K> Drop for AdminConsole<C, S, K> {
    fn drop(&mut self) {
        self.session_watch.cancel();
    }
}
