use crate::api::{self, Envelope, Resource};
use crate::console::components::table::{FilterItems, TablePage};
use crate::console::Message;
use crate::event_ext::EventExt;
use crate::pagination::{ListState, LoadTicket, PageRequest};
use crate::util::MpscSenderExt;
use crossterm::event::Event;
use futures::FutureExt;
use log::warn;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use std::future::Future;
use tokio::sync::mpsc;

/// Fetches one page of a list and wraps the outcome into the page's message.
pub trait LoadPage<T>: Clone + Send + Sync + 'static {
    fn fetch(&self, request: PageRequest) -> impl Future<Output = Result<Envelope<T>, api::Error>> + Send;

    fn resource(&self) -> Resource;

    fn loaded(ticket: LoadTicket, result: Result<Envelope<T>, String>) -> Message;
}

/// A [`TablePage`] driven by a [`ListState`]: `n`/`p` move between pages, `r` reloads.
pub struct PagedTable<T, L> {
    pub table: TablePage<T>,
    state: ListState<T>,
    loader: L,
    message_tx: mpsc::Sender<Message>,
}

impl<T, L> PagedTable<T, L>
where
    T: Clone + Send + 'static,
    L: LoadPage<T>,
    TablePage<T>: FilterItems<T>,
{
    pub fn new(table: TablePage<T>, loader: L, limit: u32, message_tx: mpsc::Sender<Message>) -> Self {
        PagedTable {
            table,
            state: ListState::new(limit),
            loader,
            message_tx,
        }
    }

    pub async fn load_first_page(&mut self) {
        let ticket = self.state.goto(1);
        self.dispatch(ticket).await;
    }

    pub fn state(&self) -> &ListState<T> {
        &self.state
    }

    async fn dispatch(&mut self, ticket: Option<LoadTicket>) {
        self.sync_table();
        let Some(ticket) = ticket else {
            return;
        };
        let loader = self.loader.clone();
        let message_tx = self.message_tx.clone();
        let future = async move {
            let result = loader.fetch(ticket.request).await.map_err(|e| {
                warn!("Failed to load page {}: {e}", ticket.request.page);
                e.user_message(loader.resource())
            });
            message_tx.send_or_log(L::loaded(ticket, result)).await;
        }
        .boxed();
        self.message_tx.send_or_log(Message::RunFuture(future)).await;
    }

    pub fn complete(&mut self, ticket: LoadTicket, result: Result<Envelope<T>, String>) {
        if self.state.complete(ticket, result) {
            self.sync_table();
        }
    }

    fn sync_table(&mut self) {
        self.table.loading = self.state.is_loading();
        self.table.set_items(self.state.rows().to_vec());
    }

    /// Returns `true` when the event was consumed.
    pub async fn handle_event(&mut self, event: &Event) -> bool {
        if self.table.handle_event(event) {
            return true;
        }
        let ticket = if event.is_char('n') {
            self.state.next_page()
        } else if event.is_char('p') {
            self.state.previous_page()
        } else if event.is_char('r') {
            self.state.reload()
        } else {
            return false;
        };
        self.dispatch(ticket).await;
        true
    }

    fn status_line(&self) -> Line<'_> {
        let mut page = format!(" Page {}", self.state.request().page);
        if let Some(total_pages) = self.state.total_pages().filter(|t| *t > 0) {
            page.push_str(&format!(" of {total_pages}"));
        }
        let nav = |label: &'static str, enabled: bool| {
            let span = Span::from(label);
            if enabled && !self.state.is_loading() {
                span
            } else {
                span.fg(Color::DarkGray)
            }
        };
        let mut spans = vec![
            nav("  < Previous<p>", self.state.has_previous()),
            Span::from(page).bold(),
            nav("  Next<n> >  ", self.state.has_next()),
            Span::from("  Reload<r>"),
        ];
        if let Some(error) = self.state.error() {
            spans.push(Span::from(format!("   {error}")).fg(Color::Red).bold());
        }
        Line::from(spans)
    }

    pub fn view(&self, frame: &mut Frame, area: Rect) {
        let [table_area, status_area] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(area);
        self.table.view(frame, table_area);
        frame.render_widget(Paragraph::new(self.status_line()).on_black(), status_area);
    }
}
