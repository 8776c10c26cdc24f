//! Delivery fake that records outbound calls

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::Mutex;
use teloxide::types::{ChatId, MessageId};

use tokgrab::core::error::{AppError, AppResult};
use tokgrab::telegram::delivery::{Caption, Delivery, VideoUpload};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Text { id: MessageId, text: String },
    Video {
        file_name: String,
        caption: Option<Caption>,
        bytes: u64,
    },
    Delete { id: MessageId },
}

pub struct RecordingDelivery {
    events: Mutex<Vec<Event>>,
    next_id: AtomicI32,
    fail_deletes: bool,
    fail_videos: bool,
    /// Number of upcoming `send_text` calls that fail
    failing_texts: AtomicUsize,
}

impl RecordingDelivery {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            next_id: AtomicI32::new(1000),
            fail_deletes: false,
            fail_videos: false,
            failing_texts: AtomicUsize::new(0),
        }
    }

    /// The first `count` text sends fail
    pub fn failing_first_texts(count: usize) -> Self {
        Self {
            failing_texts: AtomicUsize::new(count),
            ..Self::new()
        }
    }

    /// Every delete attempt fails, like a group where the bot is not admin
    pub fn failing_deletes() -> Self {
        Self {
            fail_deletes: true,
            ..Self::new()
        }
    }

    /// Every video upload fails
    pub fn failing_videos() -> Self {
        Self {
            fail_videos: true,
            ..Self::new()
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Text { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn videos(&self) -> usize {
        self.events().iter().filter(|e| matches!(e, Event::Video { .. })).count()
    }
}

#[async_trait]
impl Delivery for RecordingDelivery {
    async fn send_text(&self, _chat_id: ChatId, text: &str) -> AppResult<MessageId> {
        let failing = self
            .failing_texts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(AppError::Extraction("Forbidden: bot was blocked by the user".to_string()));
        }
        let id = MessageId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.events.lock().unwrap().push(Event::Text {
            id,
            text: text.to_string(),
        });
        Ok(id)
    }

    async fn send_video(&self, _chat_id: ChatId, video: VideoUpload) -> AppResult<()> {
        if self.fail_videos {
            return Err(AppError::Extraction("HTTP Error 429: Too Many Requests".to_string()));
        }
        let bytes = video.file.metadata().await?.len();
        self.events.lock().unwrap().push(Event::Video {
            file_name: video.file_name,
            caption: video.caption,
            bytes,
        });
        Ok(())
    }

    async fn delete_message(&self, _chat_id: ChatId, message_id: MessageId) -> AppResult<()> {
        if self.fail_deletes {
            return Err(AppError::Extraction("Bad Request: message can't be deleted".to_string()));
        }
        self.events.lock().unwrap().push(Event::Delete { id: message_id });
        Ok(())
    }
}
