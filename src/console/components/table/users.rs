use crate::api::{format_timestamp, ApiClient, Envelope, IdValue, Resource, User};
use crate::console::components::table::{Action, FilterItems, LoadPage, PagedTable, TableColumn, TablePage};
use crate::console::components::user_details::UserDetailsDialog;
use crate::console::Message;
use crate::event_ext::EventExt;
use crate::pagination::{LoadTicket, PageRequest};
use crate::util::MpscSenderExt;
use crossterm::event::Event;
use futures::FutureExt;
use log::warn;
use ratatui::layout::{Constraint, Rect};
use ratatui::Frame;
use tokio::sync::mpsc;

pub enum UsersPageMessage {
    PageLoaded(LoadTicket, Result<Envelope<User>, String>),
    DetailsLoaded(IdValue, Result<User, String>),
}

impl From<UsersPageMessage> for Message {
    fn from(message: UsersPageMessage) -> Self {
        Message::Users(message)
    }
}

#[derive(Clone)]
pub struct LoadUsers<C> {
    client: C,
}

impl<C: ApiClient + Clone + Send + Sync + 'static> LoadPage<User> for LoadUsers<C> {
    async fn fetch(&self, request: PageRequest) -> Result<Envelope<User>, crate::api::Error> {
        self.client.get_users(request.page, request.limit).await
    }

    fn resource(&self) -> Resource {
        Resource::Users
    }

    fn loaded(ticket: LoadTicket, result: Result<Envelope<User>, String>) -> Message {
        UsersPageMessage::PageLoaded(ticket, result).into()
    }
}

pub struct UsersPage<C: ApiClient + Clone + Send + Sync + 'static> {
    list: PagedTable<User, LoadUsers<C>>,
    details: Option<UserDetailsDialog>,
    client: C,
    message_tx: mpsc::Sender<Message>,
}

impl<C: ApiClient + Clone + Send + Sync + 'static> UsersPage<C> {
    pub async fn new(client: C, page_size: u32, message_tx: mpsc::Sender<Message>) -> Self {
        let columns = vec![
            TableColumn::new(
                "User",
                Constraint::Ratio(1, 5),
                Box::new(|u: &User| u.name.clone().unwrap_or_else(|| "-".to_string())),
            ),
            TableColumn::new(
                "Email",
                Constraint::Ratio(1, 4),
                Box::new(|u: &User| u.email.clone().unwrap_or_else(|| "-".to_string())),
            ),
            TableColumn::new(
                "Mobile",
                Constraint::Ratio(1, 6),
                Box::new(|u: &User| u.mobile.clone().unwrap_or_else(|| "-".to_string())),
            ),
            TableColumn::new(
                "Paid",
                Constraint::Length(6),
                Box::new(|u: &User| if u.is_paid() { "Yes" } else { "No" }.to_string()),
            ),
            TableColumn::new(
                "Created",
                Constraint::Fill(1),
                Box::new(|u: &User| format_timestamp(u.created_at.as_deref())),
            ),
        ];
        let actions = vec![
            Action::always("Home", "ESC"),
            Action::always("Filter", "/"),
            Action::new(
                "Details",
                "Enter",
                Box::new(|u: Option<&User>| u.is_some_and(|u| u.identifier().is_some())),
            ),
        ];
        let table = TablePage::new("Users", columns, actions).with_empty_message("No users found.");

        let mut list = PagedTable::new(
            table,
            LoadUsers { client: client.clone() },
            page_size,
            message_tx.clone(),
        );
        list.load_first_page().await;

        UsersPage {
            list,
            details: None,
            client,
            message_tx,
        }
    }

    async fn open_details(&mut self) {
        let Some(user) = self.list.table.selected_item() else {
            return;
        };
        let Some(id) = user.identifier().cloned() else {
            self.message_tx
                .send_or_log(Message::alert("User Details", "This user has no identifier."))
                .await;
            return;
        };
        self.details = Some(UserDetailsDialog::loading(id.clone()));

        let client = self.client.clone();
        let message_tx = self.message_tx.clone();
        let future = async move {
            let result = client.get_user(&id).await.map_err(|e| {
                warn!("Failed to load user {id}: {e}");
                e.user_message(Resource::User)
            });
            message_tx
                .send_or_log(UsersPageMessage::DetailsLoaded(id, result).into())
                .await;
        }
        .boxed();
        self.message_tx.send_or_log(Message::RunFuture(future)).await;
    }

    /// Returns `true` when the event was consumed.
    pub async fn handle_event(&mut self, event: &Event) -> bool {
        if self.details.is_some() {
            if event.is_esc() || event.is_enter() {
                self.details = None;
            }
            return true;
        }
        if self.list.handle_event(event).await {
            return true;
        }
        if event.is_enter() {
            self.open_details().await;
            return true;
        }
        false
    }

    pub fn handle_message(&mut self, message: UsersPageMessage) {
        match message {
            UsersPageMessage::PageLoaded(ticket, result) => self.list.complete(ticket, result),
            UsersPageMessage::DetailsLoaded(id, result) => {
                if let Some(details) = self.details.as_mut().filter(|d| *d.user_id() == id) {
                    details.set_result(result);
                }
            }
        }
    }

    /// Whether typed characters belong to this page rather than to global shortcuts.
    pub fn is_capturing_input(&self) -> bool {
        self.details.is_some() || self.list.table.is_filter_input_active()
    }

    pub fn view(&self, frame: &mut Frame, area: Rect) {
        self.list.view(frame, area);
        if let Some(details) = &self.details {
            details.view(frame, area);
        }
    }
}

impl FilterItems<User> for TablePage<User> {
    fn matches(item: &User, search: &str) -> bool {
        [&item.name, &item.email, &item.mobile]
            .into_iter()
            .flatten()
            .any(|value| Self::match_str(value, search))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Error, MockApiClient};
    use crate::console::components::table::buffer_text;
    use crate::event_ext::key;
    use crossterm::event::KeyCode;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::sync::Arc;

    fn user(id: i64, name: &str) -> User {
        User::builder()
            .id(IdValue::from(id))
            .name(name.to_string())
            .email(format!("{}@example.com", name.to_lowercase()))
            .build()
    }

    fn users(range: std::ops::Range<i64>) -> Vec<User> {
        range.map(|i| user(i, &format!("User{i}"))).collect()
    }

    /// Runs every queued future and feeds the resulting page messages back.
    async fn drain<C: ApiClient + Clone + Send + Sync + 'static>(
        page: &mut UsersPage<C>,
        rx: &mut mpsc::Receiver<Message>,
    ) {
        while let Ok(message) = rx.try_recv() {
            match message {
                Message::RunFuture(future) => future.await,
                Message::Users(message) => page.handle_message(message),
                _ => {}
            }
        }
    }

    fn render<C: ApiClient + Clone + Send + Sync + 'static>(page: &UsersPage<C>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|frame| page.view(frame, frame.area())).unwrap();
        buffer_text(terminal.backend().buffer())
    }

    #[tokio::test]
    async fn loads_first_page_and_advances_on_full_page() {
        let mut client = MockApiClient::new();
        client
            .expect_get_users()
            .withf(|page, limit| *page == 1 && *limit == 10)
            .times(1)
            .returning(|_, _| async { Ok(Envelope::new(users(0..10))) }.boxed());
        client
            .expect_get_users()
            .withf(|page, limit| *page == 2 && *limit == 10)
            .times(1)
            .returning(|_, _| async { Ok(Envelope::new(users(10..13))) }.boxed());

        let (tx, mut rx) = mpsc::channel(16);
        let mut page = UsersPage::new(Arc::new(client), 10, tx).await;
        drain(&mut page, &mut rx).await;
        assert_eq!(page.list.table.visible_len(), 10);
        assert!(page.list.state().has_next());

        assert!(page.handle_event(&key(KeyCode::Char('n'))).await);
        drain(&mut page, &mut rx).await;
        assert_eq!(page.list.state().request().page, 2);
        assert_eq!(page.list.table.visible_len(), 3);
        assert!(!page.list.state().has_next());

        // Last page: `n` is a no-op and issues no request.
        page.handle_event(&key(KeyCode::Char('n'))).await;
        drain(&mut page, &mut rx).await;
        assert!(render(&page).contains("Page 2"));
    }

    #[tokio::test]
    async fn failure_shows_message_and_empty_table() {
        let mut client = MockApiClient::new();
        client
            .expect_get_users()
            .returning(|_, _| async { Err(Error::Api { status: 500, message: None }) }.boxed());

        let (tx, mut rx) = mpsc::channel(16);
        let mut page = UsersPage::new(Arc::new(client), 10, tx).await;
        drain(&mut page, &mut rx).await;

        assert_eq!(page.list.state().error(), Some("Failed to load users."));
        assert_eq!(page.list.table.visible_len(), 0);
        let text = render(&page);
        assert!(text.contains("Failed to load users."));
        assert!(text.contains("No users found."));
    }

    #[tokio::test]
    async fn enter_opens_details_for_selected_user() {
        let mut client = MockApiClient::new();
        client
            .expect_get_users()
            .returning(|_, _| async { Ok(Envelope::new(vec![user(42, "Grace")])) }.boxed());
        client
            .expect_get_user()
            .withf(|id| *id == IdValue::from(42))
            .times(1)
            .returning(|_| async { Ok(user(42, "Grace Hopper")) }.boxed());

        let (tx, mut rx) = mpsc::channel(16);
        let mut page = UsersPage::new(Arc::new(client), 10, tx).await;
        drain(&mut page, &mut rx).await;

        assert!(page.handle_event(&key(KeyCode::Enter)).await);
        assert!(page.details.as_ref().is_some_and(|d| d.is_loading()));
        drain(&mut page, &mut rx).await;
        assert!(render(&page).contains("Grace Hopper"));

        assert!(page.handle_event(&key(KeyCode::Esc)).await);
        assert!(page.details.is_none());
        assert!(!page.handle_event(&key(KeyCode::Esc)).await);
    }

    #[tokio::test]
    async fn user_without_identifier_raises_alert() {
        let mut client = MockApiClient::new();
        client
            .expect_get_users()
            .returning(|_, _| async { Ok(Envelope::new(vec![User::builder().name("Anon".to_string()).build()])) }.boxed());
        client.expect_get_user().never();

        let (tx, mut rx) = mpsc::channel(16);
        let mut page = UsersPage::new(Arc::new(client), 10, tx).await;
        drain(&mut page, &mut rx).await;

        page.handle_event(&key(KeyCode::Enter)).await;
        assert!(page.details.is_none());
        assert!(matches!(rx.try_recv(), Ok(Message::ShowAlert(_, _))));
    }

    #[test]
    fn filter_matches_name_email_and_mobile() {
        let user = User::builder()
            .name("Ada".to_string())
            .email("ada@math.org".to_string())
            .mobile("+44 20".to_string())
            .build();
        assert!(TablePage::<User>::matches(&user, "MATH"));
        assert!(TablePage::<User>::matches(&user, "+44"));
        assert!(!TablePage::<User>::matches(&user, "grace"));
    }
}
