use crossterm::event::Event;
use log::{debug, error};
use ratatui::Frame;
use std::future::Future;
use std::io;
use tokio::sync::mpsc;

/// Forwards terminal events from a reader thread onto a channel. The thread is detached so a
/// pending `read` never holds up shutdown.
fn terminal_events() -> mpsc::Receiver<Event> {
    let (sender, receiver) = mpsc::channel(16);
    std::thread::spawn(move || loop {
        match crossterm::event::read() {
            Ok(event) => {
                if sender.blocking_send(event).is_err() {
                    break;
                }
            }
            Err(e) => {
                error!("Failed to read terminal event: {e}");
                break;
            }
        }
    });
    receiver
}

pub trait Application {
    type Message: Send + 'static;

    fn view(&self, frame: &mut Frame);
    fn handle_event(&mut self, event: &Event) -> impl Future<Output = ()>;
    fn handle_message(&mut self, message: Self::Message) -> impl Future<Output = ()>;
    fn is_finished(&self) -> bool;

    /// Draws, then waits for either a key press or an application message, until finished.
    async fn run(&mut self, mut messages: mpsc::Receiver<Self::Message>) -> io::Result<()> {
        let mut terminal = ratatui::init();
        let mut events = terminal_events();

        let result = async {
            terminal.clear()?;
            loop {
                terminal.draw(|frame| self.view(frame))?;
                if self.is_finished() {
                    break;
                }
                tokio::select! {
                    Some(event) = events.recv() => self.handle_event(&event).await,
                    Some(message) = messages.recv() => self.handle_message(message).await,
                    else => {
                        debug!("All event sources closed");
                        break;
                    }
                }
            }
            Ok(())
        }
        .await;

        ratatui::restore();
        result
    }
}
