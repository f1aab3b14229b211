use std::{sync::Arc, time::Duration};

use anyhow::{Error, Result, anyhow};
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use whatsapp_service::{
    api,
    clients::{alerter::TelegramAlerter, gateway::HttpGateway, store::PgStore},
    config::Config,
    scheduler,
    session::{self, SessionState},
    utils::retry_with_backoff,
    worker,
};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::load()?;
    let timezone = config.timezone()?;

    info!("Configuration validated");

    let retry_config = config.retry_config();
    let store = Arc::new(
        retry_with_backoff(&retry_config, || PgStore::connect(&config.database_url)).await?,
    );

    let gateway = Arc::new(HttpGateway::new(&config)?);
    let alerter = Arc::new(TelegramAlerter::new(&config));

    let (state_tx, state_rx) = watch::channel(SessionState::Disconnected);

    tokio::spawn(session::run_session_monitor(
        Arc::clone(&gateway),
        Arc::clone(&alerter),
        state_tx,
        Duration::from_secs(config.session_poll_interval_seconds),
        Duration::from_secs(config.reconnect_backoff_seconds),
    ));

    tokio::spawn(worker::run_worker(
        Arc::clone(&gateway),
        Arc::clone(&store),
        config.delivery_options(),
        Duration::from_secs(config.queue_poll_interval_seconds),
        state_rx.clone(),
    ));

    tokio::spawn(scheduler::run_scheduler(
        Arc::clone(&gateway),
        Arc::clone(&store),
        Arc::clone(&store),
        config.delivery_options(),
        timezone,
        config.reminder_hour,
        config.reminder_minute,
        state_rx,
    ));

    api::run_api_server(config)
        .await
        .map_err(|e| anyhow!("API server failed: {}", e))?;

    Ok(())
}
