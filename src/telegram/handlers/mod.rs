//! Telegram bot handler tree configuration
//!
//! The handler tree is built by [`schema`]; the per-message logic lives in
//! [`links`] and works against the `Delivery` trait so integration tests can
//! drive it without Telegram.

mod commands;
pub mod links;
mod schema;
mod types;

pub use commands::{HELP_TEXT, START_TEXT};
pub use links::{handle_link_message, too_large_message, NO_URL_REPLY, STATUS_TEXT};
pub use schema::schema;
pub use types::{HandlerDeps, HandlerError, IncomingRequest};
