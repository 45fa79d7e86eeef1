use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers};

pub trait EventExt {
    fn is_enter(&self) -> bool;
    fn is_esc(&self) -> bool;
    fn is_stop(&self) -> bool;
    /// A plain key press of `c`, without Ctrl or Alt.
    fn is_char(&self, c: char) -> bool;
}

impl EventExt for Event {
    fn is_enter(&self) -> bool {
        matches!(self, Event::Key(key_event) if key_event.code == KeyCode::Enter && key_event.kind != KeyEventKind::Release)
    }

    fn is_esc(&self) -> bool {
        matches!(self, Event::Key(key_event) if key_event.code == KeyCode::Esc && key_event.kind != KeyEventKind::Release)
    }

    fn is_stop(&self) -> bool {
        match self {
            Event::Key(key_event) => {
                key_event.code == KeyCode::Char('c') && key_event.modifiers.contains(KeyModifiers::CONTROL)
            }
            _ => false,
        }
    }

    fn is_char(&self, c: char) -> bool {
        match self {
            Event::Key(key_event) => {
                key_event.code == KeyCode::Char(c)
                    && key_event.kind != KeyEventKind::Release
                    && !key_event
                        .modifiers
                        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
pub fn key(code: KeyCode) -> Event {
    Event::Key(crossterm::event::KeyEvent::new(code, KeyModifiers::NONE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEvent;

    #[test]
    fn recognizes_keys() {
        assert!(key(KeyCode::Enter).is_enter());
        assert!(key(KeyCode::Esc).is_esc());
        assert!(key(KeyCode::Char('n')).is_char('n'));
        assert!(!key(KeyCode::Char('n')).is_char('p'));
        let ctrl_c = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(ctrl_c.is_stop());
        assert!(!ctrl_c.is_char('c'));
    }
}
