use crate::api::{format_timestamp, ApiClient, Envelope, Payment, Resource};
use crate::console::components::table::{Action, FilterItems, LoadPage, PagedTable, TableColumn, TablePage};
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

const RECEIPT_TITLE: &str = "Receipt";

pub enum PaymentsPageMessage {
    PageLoaded(LoadTicket, Result<Envelope<Payment>, String>),
}

impl From<PaymentsPageMessage> for Message {
    fn from(message: PaymentsPageMessage) -> Self {
        Message::Payments(message)
    }
}

#[derive(Clone)]
pub struct LoadPayments<C> {
    client: C,
}

impl<C: ApiClient + Clone + Send + Sync + 'static> LoadPage<Payment> for LoadPayments<C> {
    async fn fetch(&self, request: PageRequest) -> Result<Envelope<Payment>, crate::api::Error> {
        self.client.get_payments(request.page, request.limit).await
    }

    fn resource(&self) -> Resource {
        Resource::Payments
    }

    fn loaded(ticket: LoadTicket, result: Result<Envelope<Payment>, String>) -> Message {
        PaymentsPageMessage::PageLoaded(ticket, result).into()
    }
}

pub struct PaymentsPage<C: ApiClient + Clone + Send + Sync + 'static> {
    list: PagedTable<Payment, LoadPayments<C>>,
    client: C,
    message_tx: mpsc::Sender<Message>,
}

impl<C: ApiClient + Clone + Send + Sync + 'static> PaymentsPage<C> {
    pub async fn new(client: C, page_size: u32, message_tx: mpsc::Sender<Message>) -> Self {
        let columns = vec![
            TableColumn::new("ID", Constraint::Length(8), Box::new(|p: &Payment| p.payment_id.to_string())),
            TableColumn::new("Name", Constraint::Ratio(1, 5), Box::new(|p: &Payment| p.name.clone())),
            TableColumn::new("Email", Constraint::Ratio(1, 4), Box::new(|p: &Payment| p.email.clone())),
            TableColumn::new(
                "Amount",
                Constraint::Length(12),
                Box::new(|p: &Payment| p.formatted_amount()),
            ),
            TableColumn::new("Status", Constraint::Length(8), Box::new(|p: &Payment| p.status.to_string())),
            TableColumn::new(
                "Created",
                Constraint::Fill(1),
                Box::new(|p: &Payment| format_timestamp(Some(&p.created_at))),
            ),
        ];
        let actions = vec![
            Action::always("Home", "ESC"),
            Action::always("Filter", "/"),
            Action::new(
                "Export Receipt",
                "e",
                Box::new(|p: Option<&Payment>| p.is_some_and(Payment::can_export_receipt)),
            ),
        ];
        let table = TablePage::new("Payments", columns, actions).with_empty_message("No payments found.");

        let mut list = PagedTable::new(
            table,
            LoadPayments { client: client.clone() },
            page_size,
            message_tx.clone(),
        );
        list.load_first_page().await;

        PaymentsPage {
            list,
            client,
            message_tx,
        }
    }

    /// Copies the receipt link of the selected payment, fetching it when the row carries none.
    async fn export_receipt(&self) {
        let Some(payment) = self.list.table.selected_item() else {
            return;
        };
        if !payment.can_export_receipt() {
            self.message_tx
                .send_or_log(Message::alert(
                    RECEIPT_TITLE,
                    format!("Receipts are only available for paid payments (status: {}).", payment.status),
                ))
                .await;
            return;
        }
        if let Some(url) = payment.receipt_url.clone().filter(|u| !u.is_empty()) {
            self.message_tx
                .send_or_log(Message::CopyToClipboard {
                    title: RECEIPT_TITLE.to_string(),
                    text: url,
                })
                .await;
            return;
        }

        let client = self.client.clone();
        let message_tx = self.message_tx.clone();
        let payment_id = payment.payment_id;
        let future = async move {
            let message = match client.get_receipt_url(payment_id).await {
                Ok(url) => Message::CopyToClipboard {
                    title: RECEIPT_TITLE.to_string(),
                    text: url,
                },
                Err(e) => {
                    warn!("Failed to load receipt for payment {payment_id}: {e}");
                    Message::alert("Error", e.user_message(Resource::Receipt))
                }
            };
            message_tx.send_or_log(message).await;
        }
        .boxed();
        self.message_tx.send_or_log(Message::RunFuture(future)).await;
    }

    /// Returns `true` when the event was consumed.
    pub async fn handle_event(&mut self, event: &Event) -> bool {
        if self.list.handle_event(event).await {
            return true;
        }
        if event.is_char('e') {
            self.export_receipt().await;
            return true;
        }
        false
    }

    pub fn handle_message(&mut self, message: PaymentsPageMessage) {
        match message {
            PaymentsPageMessage::PageLoaded(ticket, result) => self.list.complete(ticket, result),
        }
    }

    pub fn is_capturing_input(&self) -> bool {
        self.list.table.is_filter_input_active()
    }

    pub fn view(&self, frame: &mut Frame, area: Rect) {
        self.list.view(frame, area);
    }
}

impl FilterItems<Payment> for TablePage<Payment> {
    fn matches(item: &Payment, search: &str) -> bool {
        Self::match_str(&item.name, search)
            || Self::match_str(&item.email, search)
            || Self::match_str(&item.stripe_session_id, search)
            || Self::match_str(&item.payment_id.to_string(), search)
            || Self::match_str(&item.status.to_string(), search)
    }
}
