pub mod clipboard;

use log::warn;
use std::future::Future;
use tokio::sync::mpsc;

pub trait MpscSenderExt<T> {
    /// Sends, logging instead of failing when the receiving side has shut down.
    fn send_or_log(&self, message: T) -> impl Future<Output = ()> + Send;
}

impl<T: Send> MpscSenderExt<T> for mpsc::Sender<T> {
    async fn send_or_log(&self, message: T) {
        if self.send(message).await.is_err() {
            warn!("Dropping message, the console is no longer listening");
        }
    }
}
