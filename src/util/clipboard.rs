use log::warn;

#[cfg_attr(test, mockall::automock)]
pub trait ClipboardAccess {
    fn copy(&mut self, text: &str) -> Result<(), String>;
}

/// The OS clipboard, opened on first use so headless sessions still start.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl ClipboardAccess for SystemClipboard {
    fn copy(&mut self, text: &str) -> Result<(), String> {
        if self.inner.is_none() {
            let clipboard = arboard::Clipboard::new().map_err(|e| {
                warn!("Clipboard unavailable: {e}");
                e.to_string()
            })?;
            self.inner = Some(clipboard);
        }
        match self.inner.as_mut() {
            Some(clipboard) => clipboard.set_text(text.to_string()).map_err(|e| e.to_string()),
            None => Err("clipboard unavailable".to_string()),
        }
    }
}
