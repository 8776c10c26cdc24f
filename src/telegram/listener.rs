//! Update delivery: long polling or an axum-served webhook.

use std::net::SocketAddr;

use anyhow::Result;
use axum::routing::get;
use axum::Router;
use teloxide::dispatching::{DefaultKey, Dispatcher};
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks::{self, Options};
use teloxide::update_listeners::Polling;
use url::Url;

use crate::telegram::handlers::{schema, HandlerDeps, HandlerError};
use crate::telegram::Bot;

/// Body of the `GET /` health route
pub const HEALTH_TEXT: &str = "Bot is running!";

/// Dispatcher over the handler tree; Ctrl-C stops it gracefully.
pub fn build_dispatcher(bot: Bot, deps: HandlerDeps) -> Dispatcher<Bot, HandlerError, DefaultKey> {
    Dispatcher::builder(bot, schema(deps))
        .enable_ctrlc_handler()
        .error_handler(LoggingErrorHandler::with_custom_text("An error from a handler"))
        .build()
}

/// Pull mode: polls getUpdates, dropping updates queued while offline.
pub async fn run_polling(bot: Bot, deps: HandlerDeps) -> Result<()> {
    log::info!("Starting bot in long polling mode");

    // A leftover webhook would make getUpdates fail
    if let Err(e) = bot.delete_webhook().await {
        log::warn!("Failed to delete webhook before polling: {}", e);
    }

    let listener = Polling::builder(bot.clone()).drop_pending_updates().build();
    build_dispatcher(bot, deps)
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        )
        .await;

    log::info!("Dispatcher shutdown gracefully");
    Ok(())
}

/// Push mode: registers `url` with Telegram and serves it on `0.0.0.0:port`,
/// next to a `GET /` health route.
pub async fn run_webhook(bot: Bot, deps: HandlerDeps, url: Url, port: u16) -> Result<()> {
    let address = SocketAddr::from(([0, 0, 0, 0], port));
    log::info!("Starting bot in webhook mode at {} (listening on {})", url, address);

    let options = Options::new(address, url).drop_pending_updates();
    let (listener, stop_flag, webhook_router) = webhooks::axum_to_router(bot.clone(), options).await?;

    let app = Router::new().route("/", get(health)).merge(webhook_router);

    let tcp = tokio::net::TcpListener::bind(address).await?;
    let server = tokio::spawn(async move {
        axum::serve(tcp, app).with_graceful_shutdown(stop_flag).await
    });

    build_dispatcher(bot, deps)
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        )
        .await;

    match server.await {
        Ok(Ok(())) => log::info!("Webhook server stopped"),
        Ok(Err(e)) => log::error!("Webhook server error: {}", e),
        Err(e) => log::error!("Webhook server task failed: {}", e),
    }
    Ok(())
}

async fn health() -> &'static str {
    HEALTH_TEXT
}
