mod api;
mod appframework;
mod config;
mod console;
mod event_ext;
mod logging;
mod pagination;
mod session;
mod util;

use crate::api::HttpClient;
use crate::appframework::Application;
use crate::config::Config;
use crate::console::AdminConsole;
use crate::session::{SessionContext, SessionFile};
use crate::util::clipboard::SystemClipboard;
use anyhow::Context;
use log::info;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Invalid configuration")?;
    let _logger = logging::init(&config)?;
    info!("Starting paydesk against {}", config.api_base_url);

    let session = SessionContext::restore(SessionFile(config.session_file.clone()))
        .context("Failed to read the stored session")?;
    let api_client = HttpClient::from_config(&config, session.clone()).context("Failed to create HTTP client")?;

    let (message_tx, message_rx) = mpsc::channel(64);
    let mut console = AdminConsole::new(
        api_client,
        session,
        SystemClipboard::default(),
        config.page_size,
        message_tx,
    )
    .await;
    console.run(message_rx).await?;

    info!("paydesk exited");
    Ok(())
}
