mod action;
mod filter;
mod paged;
pub mod payments;
pub mod users;

pub use action::Action;
use filter::Filter;
pub use paged::{LoadPage, PagedTable};

use crossterm::event::{Event, KeyCode};
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Row, Table, TableState};
use ratatui::Frame;
use std::rc::Rc;
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

pub trait FilterItems<T> {
    fn match_str(value: &str, search: &str) -> bool {
        value.to_lowercase().contains(&search.to_lowercase())
    }

    fn matches(item: &T, search: &str) -> bool;
}

pub struct TableColumn<T> {
    header: String,
    width: Constraint,
    get_value: Box<dyn Fn(&T) -> String>,
}

impl<T> TableColumn<T> {
    pub fn new<H: Into<String>>(header: H, width: Constraint, get_value: Box<dyn Fn(&T) -> String>) -> Self {
        TableColumn {
            header: header.into(),
            width,
            get_value,
        }
    }
}

pub struct TablePage<T> {
    title: String,
    columns: Vec<TableColumn<T>>,
    items: Vec<Rc<T>>,
    visible_items: Vec<Rc<T>>,
    selected: Option<usize>,
    filter: Filter,
    actions: Vec<Action<T>>,
    empty_message: String,
    pub loading: bool,
}

impl<T> TablePage<T>
where
    TablePage<T>: FilterItems<T>,
{
    pub fn new<S: Into<String>>(title: S, columns: Vec<TableColumn<T>>, actions: Vec<Action<T>>) -> Self {
        TablePage {
            title: title.into(),
            columns,
            items: Vec::new(),
            visible_items: Vec::new(),
            selected: None,
            filter: Filter::Disabled,
            actions,
            empty_message: "Nothing to show.".to_string(),
            loading: false,
        }
    }

    pub fn with_empty_message<S: Into<String>>(mut self, message: S) -> Self {
        self.empty_message = message.into();
        self
    }

    /// Replaces the rows, keeping any filter that is currently applied.
    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items.into_iter().map(Rc::new).collect();
        self.apply_filter();
    }

    pub fn selected_item(&self) -> Option<Rc<T>> {
        self.selected.and_then(|i| self.visible_items.get(i).cloned())
    }

    pub fn visible_len(&self) -> usize {
        self.visible_items.len()
    }

    pub fn is_filter_input_active(&self) -> bool {
        self.filter.is_input()
    }

    fn apply_filter(&mut self) {
        self.visible_items = match self.filter.search() {
            Some(search) if !search.is_empty() => self
                .items
                .iter()
                .filter(|i| Self::matches(i.as_ref(), search))
                .map(Rc::clone)
                .collect(),
            _ => self.items.clone(),
        };
        self.selected = if self.visible_items.is_empty() { None } else { Some(0) };
    }

    fn reset_filter(&mut self) {
        self.filter = Filter::Disabled;
        self.apply_filter();
    }

    fn select_next(&mut self) {
        if let Some(selected_index) = self.selected {
            if selected_index + 1 < self.visible_items.len() {
                self.selected = Some(selected_index + 1);
            }
        }
    }

    fn select_previous(&mut self) {
        if let Some(selected_index) = self.selected {
            self.selected = Some(selected_index.saturating_sub(1));
        }
    }

    /// Handles selection and filtering keys. Returns `true` when the event was consumed.
    pub fn handle_event(&mut self, event: &Event) -> bool {
        let Event::Key(key_event) = event else {
            return false;
        };

        if let Filter::Input(input) = &mut self.filter {
            match key_event.code {
                KeyCode::Enter => {
                    self.filter = Filter::Value(input.value().to_string());
                }
                KeyCode::Esc => self.reset_filter(),
                _ => {
                    input.handle_event(event);
                    self.apply_filter();
                }
            }
            return true;
        }

        match key_event.code {
            KeyCode::Up => self.select_previous(),
            KeyCode::Down => self.select_next(),
            KeyCode::Char('/') => self.filter = Filter::Input(Input::default()),
            KeyCode::Esc if self.filter.is_active() => self.reset_filter(),
            _ => return false,
        }
        true
    }

    fn instructions(&self) -> Line<'_> {
        let selected = self.selected_item();
        let mut spans = vec![Span::from("  Quit<Ctrl + C>  ")];
        spans.extend(self.actions.iter().map(|action| {
            let span = Span::from(format!("  {}<{}>  ", action.name, action.shortcut));
            if action.is_enabled(selected.as_deref()) {
                span
            } else {
                span.fg(Color::DarkGray)
            }
        }));
        Line::from(spans)
    }

    fn table(&self) -> Table<'_> {
        let mut title = self.title.clone();
        if self.loading {
            title.push_str(" (loading...)");
        } else if let Filter::Value(value) = &self.filter {
            title.push_str(&format!(" [/{value}]"));
        }

        let block = Block::bordered()
            .title_top(Line::from(title.bold()).alignment(Alignment::Center))
            .title_bottom(self.instructions().alignment(Alignment::Center))
            .light_blue()
            .bg(Color::Black);

        let rows: Vec<Row> = self
            .visible_items
            .iter()
            .map(|i| self.columns.iter().map(|c| (c.get_value)(i.as_ref())).collect())
            .collect();
        let header = Row::new(
            self.columns
                .iter()
                .map(|c| c.header.clone().bold().fg(Color::White))
                .collect::<Vec<Span>>(),
        );
        let widths: Vec<Constraint> = self.columns.iter().map(|c| c.width).collect();

        Table::new(rows, widths)
            .header(header)
            .highlight_style(Style::new().reversed())
            .block(block)
    }

    pub fn view(&self, frame: &mut Frame, area: Rect) {
        let search_height = if self.filter.is_input() { 3 } else { 0 };
        let [search_area, table_area] =
            Layout::vertical([Constraint::Length(search_height), Constraint::Fill(1)]).areas(area);

        if let Filter::Input(search) = &self.filter {
            let paragraph = Paragraph::new(format!("/{}", search.value()))
                .block(Block::bordered().light_blue().on_black())
                .alignment(Alignment::Left);
            frame.render_widget(paragraph, search_area);
            frame.set_cursor_position((
                search_area.x + 2 + search.visual_cursor() as u16,
                search_area.y + 1,
            ));
        }

        let mut table_state = TableState::new();
        table_state.select(self.selected);
        frame.render_stateful_widget(self.table(), table_area, &mut table_state);

        if self.visible_items.is_empty() && !self.loading {
            let [_, message_area, _] = Layout::vertical([
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Fill(1),
            ])
            .areas(table_area);
            frame.render_widget(
                Paragraph::new(self.empty_message.as_str())
                    .alignment(Alignment::Center)
                    .fg(Color::DarkGray),
                message_area,
            );
        }
    }
}

#[cfg(test)]
pub(crate) fn buffer_text(buffer: &ratatui::buffer::Buffer) -> String {
    let width = buffer.area.width as usize;
    buffer
        .content()
        .chunks(width)
        .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}
