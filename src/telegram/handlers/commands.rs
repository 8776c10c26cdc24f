//! Command handler implementations (/start, /help)

use teloxide::types::ChatId;

use super::types::HandlerError;
use crate::telegram::delivery::Delivery;

pub const START_TEXT: &str = "Hi! Send me a TikTok video URL";

pub const HELP_TEXT: &str = "Just paste a TikTok URL. I'll fetch the video without watermarks. Supports MP4 downloads.";

/// Handle /start command
pub(super) async fn handle_start_command(delivery: &dyn Delivery, chat_id: ChatId) -> Result<(), HandlerError> {
    delivery.send_text(chat_id, START_TEXT).await?;
    Ok(())
}

/// Handle /help command
pub(super) async fn handle_help_command(delivery: &dyn Delivery, chat_id: ChatId) -> Result<(), HandlerError> {
    delivery.send_text(chat_id, HELP_TEXT).await?;
    Ok(())
}
