//! Tokgrab - Telegram bot that fetches TikTok videos through yt-dlp
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging and small utilities
//! - `download`: link extraction, the yt-dlp backend, failure classification
//!   and the retrieval pipeline
//! - `telegram`: bot setup, update delivery and handlers

pub mod cli;
pub mod core;
pub mod download;
pub mod telegram;

// Re-export commonly used types for convenience
pub use crate::core::{config, AppError, AppResult, BotConfig};
pub use download::{RetrievalOutcome, RetrievalPipeline};
pub use telegram::{schema, HandlerDeps};
