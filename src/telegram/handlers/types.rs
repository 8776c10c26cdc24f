//! Handler types and dependencies

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use teloxide::types::{ChatId, Message, MessageId, UserId};

use crate::core::utils::log_preview;
use crate::download::RetrievalPipeline;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub pipeline: Arc<RetrievalPipeline>,
    /// Pause after every processed URL
    pub download_delay: Duration,
}

impl HandlerDeps {
    /// Create new handler dependencies
    pub fn new(pipeline: Arc<RetrievalPipeline>, download_delay: Duration) -> Self {
        Self {
            pipeline,
            download_delay,
        }
    }
}

/// An inbound text message, reduced to what the link handler needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingRequest {
    pub chat_id: ChatId,
    pub sender_id: Option<UserId>,
    pub message_id: MessageId,
    pub text: String,
}

impl IncomingRequest {
    /// Extract the request from a Telegram message; None for non-text messages.
    pub fn from_message(msg: &Message) -> Option<Self> {
        Some(Self {
            chat_id: msg.chat.id,
            sender_id: msg.from.as_ref().map(|u| u.id),
            message_id: msg.id,
            text: msg.text()?.to_string(),
        })
    }

    /// One-line summary for log records.
    pub fn summary(&self) -> RequestSummary<'_> {
        RequestSummary(self)
    }
}

/// Display adapter: chat, sender and message ids plus a short text preview
pub struct RequestSummary<'a>(&'a IncomingRequest);

impl fmt::Display for RequestSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let req = self.0;
        let sender = req
            .sender_id
            .map(|id| id.0.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        write!(
            f,
            "chat={} sender={} message={} text=\"{}\"",
            req.chat_id,
            sender,
            req.message_id.0,
            log_preview(&req.text, 100)
        )
    }
}
