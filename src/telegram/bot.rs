//! Bot initialization
//!
//! This module contains:
//! - Command enum definition
//! - Bot instance creation
//! - Command menu registration

use reqwest::ClientBuilder;
use secrecy::ExposeSecret;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::core::config::BotConfig;
use crate::telegram::Bot;

/// Bot API requests time out after this long. Uploads of up to 50 MiB need
/// the generous margin.
const BOT_API_TIMEOUT: Duration = Duration::from_secs(300);

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "greeting")]
    Start,
    #[command(description = "how to use the bot")]
    Help,
}

/// Creates a Bot instance with custom or default API URL
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(anyhow::Error)` - No token configured, or the HTTP client could not be built
pub fn create_bot(config: &BotConfig) -> anyhow::Result<Bot> {
    let client = ClientBuilder::new().timeout(BOT_API_TIMEOUT).build()?;
    let bot = Bot::with_client(config.bot_token()?.expose_secret(), client);

    let bot = match &config.bot_api_url {
        Some(url) => {
            log::info!("Using custom Bot API URL: {}", url);
            bot.set_api_url(url.clone())
        }
        None => bot,
    };

    Ok(bot)
}

/// Sets up bot commands in Telegram UI
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(Command::bot_commands()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parsing() {
        assert_eq!(Command::parse("/start", "tokgrab_bot").ok(), Some(Command::Start));
        assert_eq!(Command::parse("/help", "tokgrab_bot").ok(), Some(Command::Help));
        assert_eq!(Command::parse("/help@tokgrab_bot", "tokgrab_bot").ok(), Some(Command::Help));
        assert!(Command::parse("/unknown", "tokgrab_bot").is_err());
    }

    #[test]
    fn test_command_menu() {
        let commands = Command::bot_commands();
        assert_eq!(commands.len(), 2);
        assert!(commands[0].command.ends_with("start"));
        assert!(commands[1].command.ends_with("help"));
    }
}
