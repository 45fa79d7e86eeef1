use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Flex, Layout, Rect};
use ratatui::prelude::{Line, Span, Stylize, Widget};
use ratatui::widgets::{Block, Clear, Paragraph, Wrap};

/// A modal notice dismissed with Enter or Esc.
pub struct Alert<'a> {
    title: &'a str,
    message: &'a str,
}

impl<'a> Alert<'a> {
    pub fn new(title: &'a str, message: &'a str) -> Self {
        Self { title, message }
    }

    fn height(&self, area: Rect) -> u16 {
        let text_lines = self.message.lines().count().max(1) as u16;
        (text_lines + 6).clamp(7, area.height.max(7))
    }
}

impl Widget for Alert<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let vertical = Layout::vertical([Constraint::Length(self.height(area))]).flex(Flex::Center);
        let horizontal = Layout::horizontal([Constraint::Percentage(50)]).flex(Flex::Center);
        let [area] = vertical.areas(area);
        let [area] = horizontal.areas(area);

        let block = Block::bordered()
            .light_blue()
            .on_black()
            .title_alignment(Alignment::Center)
            .title(Span::from(format!(" {} ", self.title)).bold());

        let [_, text_area, _, button_area, _] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(block.inner(area));

        let lines: Vec<Line> = self.message.lines().map(Line::raw).collect();
        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        let ok_button = Paragraph::new(Line::from(Span::from("    Ok    ").bold().reversed()))
            .alignment(Alignment::Center);

        Clear.render(area, buf);
        block.render(area, buf);
        paragraph.render(text_area, buf);
        ok_button.render(button_area, buf);
    }
}
