use crate::console::components::navigation_input::COMMANDS;
use crate::console::{Message, Route};
use crate::event_ext::EventExt;
use crossterm::event::Event;
use ratatui::layout::{Alignment, Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Stylize};
use ratatui::text::Line;
use ratatui::widgets::{Block, Paragraph};
use ratatui::Frame;

/// Landing page after login.
pub struct HomePage {
    admin_name: String,
}

impl HomePage {
    pub fn new(admin_name: String) -> Self {
        HomePage { admin_name }
    }

    /// Shortcut keys for the sections. Everything else is left to the console.
    pub fn handle_event(&self, event: &Event) -> Option<Message> {
        if event.is_char('u') {
            Some(Message::Navigate(Route::Users))
        } else if event.is_char('p') {
            Some(Message::Navigate(Route::Payments))
        } else if event.is_char('L') {
            Some(Message::Logout)
        } else {
            None
        }
    }

    pub fn view(&self, frame: &mut Frame, area: Rect) {
        let [area] = Layout::vertical([Constraint::Length(12)]).flex(Flex::Center).areas(area);
        let [area] = Layout::horizontal([Constraint::Percentage(60)]).flex(Flex::Center).areas(area);

        let lines = vec![
            Line::from(format!("Welcome back, {}", self.admin_name)).bold(),
            Line::raw(""),
            Line::from("  Users<u>       browse registered users"),
            Line::from("  Payments<p>    browse payments and export receipts"),
            Line::from("  Logout<L>      end this session"),
            Line::raw(""),
            Line::from(format!("Press : for commands ({COMMANDS})")).fg(Color::DarkGray),
            Line::from("Quit<Ctrl + C>").fg(Color::DarkGray),
        ];
        let paragraph = Paragraph::new(lines).alignment(Alignment::Center).block(
            Block::bordered()
                .light_blue()
                .on_black()
                .title_top(Line::from(" Dashboard ".bold()).alignment(Alignment::Center)),
        );
        frame.render_widget(paragraph, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_ext::key;
    use crossterm::event::KeyCode;

    #[test]
    fn shortcuts_map_to_routes() {
        let home = HomePage::new("Administrator".to_string());
        assert!(matches!(
            home.handle_event(&key(KeyCode::Char('u'))),
            Some(Message::Navigate(Route::Users))
        ));
        assert!(matches!(
            home.handle_event(&key(KeyCode::Char('p'))),
            Some(Message::Navigate(Route::Payments))
        ));
        assert!(home.handle_event(&key(KeyCode::Char('x'))).is_none());
    }
}
