//! Telegram bot integration and handlers

pub mod bot;
pub mod delivery;
pub mod handlers;
pub mod listener;

pub use teloxide::Bot;

// Re-exports for convenience
pub use bot::{create_bot, setup_bot_commands, Command};
pub use delivery::{Delivery, TelegramDelivery};
pub use handlers::{schema, HandlerDeps, HandlerError};
pub use listener::{run_polling, run_webhook};
