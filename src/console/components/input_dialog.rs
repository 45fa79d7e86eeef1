use crossterm::event::{Event, KeyCode};
use ratatui::layout::{Alignment, Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph, Wrap};
use ratatui::Frame;
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;
use unicode_width::UnicodeWidthStr;

pub struct InputField<FieldId> {
    pub id: FieldId,
    pub title: String,
    pub value: Input,
    masked: bool,
    error: Option<String>,
}

impl<FieldId> InputField<FieldId> {
    pub fn new<T: Into<String>, V: Into<String>>(id: FieldId, title: T, value: V) -> Self {
        Self {
            id,
            title: title.into(),
            value: Input::new(value.into()),
            masked: false,
            error: None,
        }
    }

    /// Renders the value as bullets.
    pub fn masked(mut self) -> Self {
        self.masked = true;
        self
    }

    fn display_value(&self) -> String {
        if self.masked {
            "•".repeat(self.value.value().chars().count())
        } else {
            self.value.value().to_string()
        }
    }
}

pub struct Button<ButtonId> {
    id: ButtonId,
    title: String,
}

impl<ButtonId> Button<ButtonId> {
    pub fn new<T: Into<String>>(id: ButtonId, title: T) -> Self {
        Self { id, title: title.into() }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum SelectedItem {
    Field(usize),
    Button(usize),
}

/// A line shown under the fields, above the buttons.
pub enum Notice {
    Info(String),
    Error(String),
}

/// A centered form: a column of labelled inputs and a row of buttons.
///
/// Up/Down/Tab move between items, Enter on a field moves to the next one and Enter on a
/// button reports that button's id.
pub struct InputDialog<FieldId, ButtonId> {
    title: String,
    fields: Vec<InputField<FieldId>>,
    buttons: Vec<Button<ButtonId>>,
    width: Constraint,
    selected_item: SelectedItem,
    notice: Option<Notice>,
}

impl<FieldId, ButtonId> InputDialog<FieldId, ButtonId>
where
    FieldId: Copy + Eq,
    ButtonId: Copy,
{
    pub fn new<T: Into<String>>(title: T, fields: Vec<InputField<FieldId>>, buttons: Vec<Button<ButtonId>>) -> Self {
        Self {
            title: title.into(),
            selected_item: SelectedItem::Field(0),
            fields,
            buttons,
            width: Constraint::Percentage(50),
            notice: None,
        }
    }

    pub fn set_notice(&mut self, notice: Option<Notice>) {
        self.notice = notice;
    }

    #[cfg(test)]
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn set_error(&mut self, field: FieldId, error: Option<String>) {
        if let Some(f) = self.fields.iter_mut().find(|f| f.id == field) {
            f.error = error;
        }
    }

    pub fn clear_errors(&mut self) {
        for field in &mut self.fields {
            field.error = None;
        }
    }

    pub fn focus(&mut self, field: FieldId) {
        if let Some(index) = self.fields.iter().position(|f| f.id == field) {
            self.selected_item = SelectedItem::Field(index);
        }
    }

    pub fn get_value(&self, field: FieldId) -> Option<&str> {
        self.fields.iter().find(|f| f.id == field).map(|f| f.value.value())
    }

    pub fn handle_event(&mut self, event: &Event) -> Option<ButtonId> {
        let Event::Key(key_event) = event else {
            return None;
        };
        let field_count = self.fields.len();
        let button_count = self.buttons.len();

        match (self.selected_item, key_event.code) {
            (SelectedItem::Field(i), KeyCode::Up) => {
                self.selected_item = SelectedItem::Field(i.saturating_sub(1));
            }
            (SelectedItem::Field(i), KeyCode::Down | KeyCode::Tab | KeyCode::Enter) => {
                self.selected_item = if i + 1 < field_count {
                    SelectedItem::Field(i + 1)
                } else if key_event.code == KeyCode::Enter && button_count > 0 {
                    return Some(self.buttons[0].id);
                } else {
                    SelectedItem::Button(0)
                };
            }
            (SelectedItem::Field(i), _) => {
                if let Some(field) = self.fields.get_mut(i) {
                    field.value.handle_event(event);
                    field.error = None;
                }
            }
            (SelectedItem::Button(_), KeyCode::Up) if field_count > 0 => {
                self.selected_item = SelectedItem::Field(field_count - 1);
            }
            (SelectedItem::Button(i), KeyCode::Left) => {
                self.selected_item = SelectedItem::Button(i.saturating_sub(1));
            }
            (SelectedItem::Button(i), KeyCode::Right) if i + 1 < button_count => {
                self.selected_item = SelectedItem::Button(i + 1);
            }
            (SelectedItem::Button(i), KeyCode::Tab) => {
                self.selected_item = if i + 1 < button_count {
                    SelectedItem::Button(i + 1)
                } else {
                    SelectedItem::Field(0)
                };
            }
            (SelectedItem::Button(i), KeyCode::Enter) => {
                return self.buttons.get(i).map(|b| b.id);
            }
            _ => {}
        }
        None
    }

    fn inputs(&self, max_title_len: usize) -> Paragraph<'_> {
        let lines: Vec<Line> = self
            .fields
            .iter()
            .flat_map(|field| {
                let padding = " ".repeat(max_title_len - field.title.width());
                let error = match &field.error {
                    Some(error) => Line::from(format!("{}  {error}", " ".repeat(max_title_len))).fg(Color::Red),
                    None => Line::raw(""),
                };
                [
                    Line::from(format!("{}:{padding} {}", field.title, field.display_value())).bold(),
                    error,
                ]
            })
            .collect();
        Paragraph::new(lines).alignment(Alignment::Left)
    }

    fn buttons(&self) -> Paragraph<'_> {
        let buttons: Vec<Span> = self
            .buttons
            .iter()
            .enumerate()
            .map(|(i, button)| {
                let span = Span::from(format!("    {}    ", button.title)).bold();
                if self.selected_item == SelectedItem::Button(i) {
                    span.reversed()
                } else {
                    span
                }
            })
            .collect();
        Paragraph::new(Line::from(buttons)).alignment(Alignment::Center)
    }

    fn notice_paragraph(&self) -> Paragraph<'_> {
        let line = match &self.notice {
            Some(Notice::Info(text)) => Line::from(text.as_str()).fg(Color::Green),
            Some(Notice::Error(text)) => Line::from(text.as_str()).fg(Color::Red).bold(),
            None => Line::raw(""),
        };
        Paragraph::new(line).alignment(Alignment::Center).wrap(Wrap { trim: true })
    }

    pub fn view(&self, frame: &mut Frame, area: Rect) {
        let height = self.fields.len() as u16 * 2 + 8;
        let [area] = Layout::vertical([Constraint::Length(height)]).flex(Flex::Center).areas(area);
        let [area] = Layout::horizontal([self.width]).flex(Flex::Center).areas(area);

        let block = Block::bordered()
            .light_blue()
            .on_black()
            .title_alignment(Alignment::Center)
            .title(format!(" {} ", self.title).bold());
        let inner_area = block.inner(area);

        let [_, input_area, notice_area, _, button_area, _] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .horizontal_margin(2)
        .areas(inner_area);

        let max_title_len = self.fields.iter().map(|f| f.title.width()).max().unwrap_or(0);

        frame.render_widget(Clear, area);
        frame.render_widget(block, area);
        frame.render_widget(self.inputs(max_title_len), input_area);
        frame.render_widget(self.notice_paragraph(), notice_area);
        frame.render_widget(self.buttons(), button_area);

        if let SelectedItem::Field(i) = self.selected_item {
            if let Some(field) = self.fields.get(i) {
                frame.set_cursor_position((
                    input_area.x + max_title_len as u16 + 2 + field.value.visual_cursor() as u16,
                    input_area.y + i as u16 * 2,
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::components::table::buffer_text;
    use crate::event_ext::key;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    #[derive(Debug, Clone, Copy, Eq, PartialEq)]
    enum Field {
        Name,
        Secret,
    }

    #[derive(Debug, Clone, Copy, Eq, PartialEq)]
    enum Btn {
        Save,
        Cancel,
    }

    fn dialog() -> InputDialog<Field, Btn> {
        InputDialog::new(
            "Edit",
            vec![
                InputField::new(Field::Name, "Name", ""),
                InputField::new(Field::Secret, "Secret", "").masked(),
            ],
            vec![Button::new(Btn::Save, "Save"), Button::new(Btn::Cancel, "Cancel")],
        )
    }

    fn type_text(dialog: &mut InputDialog<Field, Btn>, text: &str) {
        for c in text.chars() {
            dialog.handle_event(&key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn enter_walks_fields_then_submits_first_button() {
        let mut dialog = dialog();
        type_text(&mut dialog, "ada");
        assert_eq!(dialog.handle_event(&key(KeyCode::Enter)), None);
        type_text(&mut dialog, "pw");
        assert_eq!(dialog.handle_event(&key(KeyCode::Enter)), Some(Btn::Save));
        assert_eq!(dialog.get_value(Field::Name), Some("ada"));
        assert_eq!(dialog.get_value(Field::Secret), Some("pw"));
    }

    #[test]
    fn buttons_are_reached_with_tab_and_arrows() {
        let mut dialog = dialog();
        dialog.handle_event(&key(KeyCode::Tab));
        dialog.handle_event(&key(KeyCode::Tab));
        dialog.handle_event(&key(KeyCode::Right));
        dialog.handle_event(&key(KeyCode::Right));
        assert_eq!(dialog.handle_event(&key(KeyCode::Enter)), Some(Btn::Cancel));
        dialog.handle_event(&key(KeyCode::Up));
        type_text(&mut dialog, "x");
        assert_eq!(dialog.get_value(Field::Secret), Some("x"));
    }

    #[test]
    fn masks_secret_and_shows_errors() {
        let mut dialog = dialog();
        dialog.focus(Field::Secret);
        type_text(&mut dialog, "hunter2");
        dialog.set_error(Field::Name, Some("Name is required".to_string()));
        dialog.set_notice(Some(Notice::Error("Login failed".to_string())));

        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|frame| dialog.view(frame, frame.area())).unwrap();
        let text = buffer_text(terminal.backend().buffer());
        assert!(!text.contains("hunter2"));
        assert!(text.contains("•••••••"));
        assert!(text.contains("Name is required"));
        assert!(text.contains("Login failed"));

        type_text(&mut dialog, "!");
        dialog.focus(Field::Name);
        type_text(&mut dialog, "a");
        terminal.draw(|frame| dialog.view(frame, frame.area())).unwrap();
        assert!(!buffer_text(terminal.backend().buffer()).contains("Name is required"));
    }
}
