use crate::api::{format_timestamp, IdValue, User};
use ratatui::layout::{Alignment, Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph, Wrap};
use ratatui::Frame;

enum Details {
    Loading,
    Loaded(Box<User>),
    Failed(String),
}

/// Modal with the full record of one user, fetched on open.
pub struct UserDetailsDialog {
    user_id: IdValue,
    details: Details,
}

impl UserDetailsDialog {
    pub fn loading(user_id: IdValue) -> Self {
        UserDetailsDialog {
            user_id,
            details: Details::Loading,
        }
    }

    pub fn user_id(&self) -> &IdValue {
        &self.user_id
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.details, Details::Loading)
    }

    pub fn set_result(&mut self, result: Result<User, String>) {
        self.details = match result {
            Ok(user) => Details::Loaded(Box::new(user)),
            Err(message) => Details::Failed(message),
        };
    }

    fn field<'a>(label: &'a str, value: String) -> Line<'a> {
        Line::from(vec![
            Span::from(format!("{label:>16}: ")).fg(Color::Gray),
            Span::from(value).bold(),
        ])
    }

    fn lines(&self) -> Vec<Line<'_>> {
        match &self.details {
            Details::Loading => vec![Line::from("Loading...").fg(Color::DarkGray)],
            Details::Failed(message) => vec![
                Line::from("No data found").bold(),
                Line::from(message.as_str()).fg(Color::Red),
            ],
            Details::Loaded(user) => {
                let text = |value: &Option<String>| {
                    value
                        .as_deref()
                        .filter(|v| !v.is_empty())
                        .unwrap_or("-")
                        .to_string()
                };
                let google = if user.google_id.as_deref().is_some_and(|g| !g.is_empty()) {
                    "Linked"
                } else {
                    "Not Linked"
                };
                let payment = if user.is_paid() { "Paid" } else { "Unpaid" };
                vec![
                    Line::from(format!("[{}]", user.initials())).bold().alignment(Alignment::Center),
                    Line::raw(""),
                    Self::field("Full Name", text(&user.name)),
                    Self::field("Email", text(&user.email)),
                    Self::field("Mobile", text(&user.mobile)),
                    Self::field("Google Account", google.to_string()),
                    Self::field("Payment Status", payment.to_string()),
                    Self::field("Created At", format_timestamp(user.created_at.as_deref())),
                ]
            }
        }
    }

    pub fn view(&self, frame: &mut Frame, area: Rect) {
        let [area] = Layout::vertical([Constraint::Length(14)]).flex(Flex::Center).areas(area);
        let [area] = Layout::horizontal([Constraint::Percentage(60)]).flex(Flex::Center).areas(area);

        let block = Block::bordered()
            .light_blue()
            .on_black()
            .title_top(Line::from(" User Details ".bold()).alignment(Alignment::Center))
            .title_bottom(Line::from("  Close<ESC>  ").alignment(Alignment::Center));
        let paragraph = Paragraph::new(self.lines())
            .block(block)
            .wrap(Wrap { trim: false });

        frame.render_widget(Clear, area);
        frame.render_widget(paragraph, area);
    }
}
