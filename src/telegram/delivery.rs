//! Conversation-facing I/O
//!
//! The [`Delivery`] trait is the seam between the link handler and Telegram;
//! production uses [`TelegramDelivery`], tests use a recording fake.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InputFile, MessageId, ParseMode};

use crate::core::error::AppResult;
use crate::core::utils::escape_markdown_v2;
use crate::telegram::Bot;

/// Uploader value yt-dlp reports when it has none
const UNKNOWN_UPLOADER: &str = "Unknown";

/// Video caption plus the parse mode it must be sent with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caption {
    pub text: String,
    /// None means plain text
    pub parse_mode: Option<ParseMode>,
}

/// A video ready for upload.
#[derive(Debug)]
pub struct VideoUpload {
    pub file: tokio::fs::File,
    pub file_name: String,
    pub caption: Option<Caption>,
}

/// Outbound operations on a conversation.
#[async_trait]
pub trait Delivery: Send + Sync {
    /// Sends plain text, returning the new message id.
    async fn send_text(&self, chat_id: ChatId, text: &str) -> AppResult<MessageId>;

    /// Uploads a video.
    async fn send_video(&self, chat_id: ChatId, video: VideoUpload) -> AppResult<()>;

    /// Deletes a message.
    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> AppResult<()>;
}

/// [`Delivery`] over the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramDelivery {
    bot: Bot,
}

impl TelegramDelivery {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Delivery for TelegramDelivery {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> AppResult<MessageId> {
        let sent = self.bot.send_message(chat_id, text).await?;
        Ok(sent.id)
    }

    async fn send_video(&self, chat_id: ChatId, video: VideoUpload) -> AppResult<()> {
        let input = InputFile::read(video.file).file_name(video.file_name);
        let mut request = self.bot.send_video(chat_id, input).supports_streaming(true);

        if let Some(caption) = video.caption {
            request = request.caption(caption.text);
            if let Some(mode) = caption.parse_mode {
                request = request.parse_mode(mode);
            }
        }

        request.await?;
        Ok(())
    }

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> AppResult<()> {
        self.bot.delete_message(chat_id, message_id).await?;
        Ok(())
    }
}

/// Deletes a message, logging (at debug level) and swallowing any failure.
///
/// Bots often lack delete rights in groups, so failure here is routine.
pub async fn delete_best_effort(delivery: &dyn Delivery, chat_id: ChatId, message_id: MessageId) {
    if let Err(e) = delivery.delete_message(chat_id, message_id).await {
        log::debug!("Could not delete message {} in chat {}: {}", message_id.0, chat_id, e);
    }
}

/// Builds the attribution caption for a video.
///
/// No caption for a missing, empty or "Unknown" uploader. Handles made only of
/// `A-Z a-z 0-9 . _` become a MarkdownV2 profile link; anything else is sent
/// as plain text so untrusted markup never reaches the parser.
pub fn build_caption(uploader: Option<&str>) -> Option<Caption> {
    let handle = uploader?.trim().trim_start_matches('@');
    if handle.is_empty() || handle == UNKNOWN_UPLOADER {
        return None;
    }

    let profile_url = format!("https://www.tiktok.com/@{}", handle);

    if is_plain_handle(handle) {
        Some(Caption {
            text: format!("[{}]({})", escape_markdown_v2(handle), profile_url),
            parse_mode: Some(ParseMode::MarkdownV2),
        })
    } else {
        Some(Caption {
            text: format!("@{} · {}", handle, profile_url),
            parse_mode: None,
        })
    }
}

fn is_plain_handle(handle: &str) -> bool {
    handle
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')
}
