use crate::console::{Message, Route};
use crate::util::MpscSenderExt;
use crossterm::event::{Event, KeyCode};
use ratatui::layout::Rect;
use ratatui::prelude::{Alignment, Stylize};
use ratatui::text::Line;
use ratatui::widgets::{Block, Paragraph};
use ratatui::Frame;
use tokio::sync::mpsc;
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

pub const COMMANDS: &str = "home | users | payments | logout | quit";

fn parse_command(command: &str) -> Option<Message> {
    match command.trim() {
        "home" | "h" => Some(Message::Navigate(Route::Home)),
        "users" | "u" => Some(Message::Navigate(Route::Users)),
        "payments" | "p" => Some(Message::Navigate(Route::Payments)),
        "logout" => Some(Message::Logout),
        "quit" | "q" => Some(Message::Quit),
        _ => None,
    }
}

/// The `:` prompt for jumping between pages.
pub struct NavigationInput {
    input: Input,
    error: Option<String>,
    message_tx: mpsc::Sender<Message>,
}

impl NavigationInput {
    pub fn new(message_tx: mpsc::Sender<Message>) -> Self {
        NavigationInput {
            input: Input::default(),
            error: None,
            message_tx,
        }
    }

    /// Returns `true` once the prompt should close.
    pub async fn handle_event(&mut self, event: &Event) -> bool {
        if let Event::Key(key_event) = event {
            match key_event.code {
                KeyCode::Esc => return true,
                KeyCode::Enter => {
                    return match parse_command(self.input.value()) {
                        Some(message) => {
                            self.message_tx.send_or_log(message).await;
                            true
                        }
                        None => {
                            self.error = Some(format!("Unknown command: {}", self.input.value().trim()));
                            false
                        }
                    };
                }
                _ => {}
            }
        }
        self.input.handle_event(event);
        self.error = None;
        false
    }

    pub fn view(&self, frame: &mut Frame, area: Rect) {
        let hint = match &self.error {
            Some(error) => Line::from(format!(" {error} ")).red(),
            None => Line::from(format!(" {COMMANDS} ")).dark_gray(),
        };
        let block = Block::bordered()
            .cyan()
            .on_black()
            .title_bottom(hint.alignment(Alignment::Right));
        let paragraph = Paragraph::new(format!(":{}", self.input.value()))
            .block(block)
            .alignment(Alignment::Left);
        frame.render_widget(paragraph, area);
        frame.set_cursor_position((area.x + 2 + self.input.visual_cursor() as u16, area.y + 1));
    }
}
