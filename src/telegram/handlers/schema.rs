//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use super::commands::{handle_help_command, handle_start_command};
use super::links::handle_link_message;
use super::types::{HandlerDeps, HandlerError, IncomingRequest};
use crate::telegram::bot::Command;
use crate::telegram::delivery::TelegramDelivery;
use crate::telegram::Bot;

/// Creates the main dispatcher schema for the Telegram bot.
///
/// Commands first, then free text. Messages starting with `/` that are not
/// known commands match neither branch and are ignored.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    dptree::entry()
        .branch(command_handler())
        .branch(message_handler(deps))
}

fn command_handler() -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        |bot: Bot, msg: Message, cmd: Command| async move {
            log::info!("🎯 Received command: {:?} from chat {}", cmd, msg.chat.id);
            let delivery = TelegramDelivery::new(bot);

            let result = match cmd {
                Command::Start => handle_start_command(&delivery, msg.chat.id).await,
                Command::Help => handle_help_command(&delivery, msg.chat.id).await,
            };
            if let Err(e) = result {
                log::error!("❌ Command {:?} failed in chat {}: {:?}", cmd, msg.chat.id, e);
            }
            Ok(())
        },
    ))
}

/// Handler for free text. Failures are logged with the request summary and
/// never propagated, so one bad request cannot affect the dispatcher.
fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter_map(|msg: Message| IncomingRequest::from_message(&msg))
        .filter(|request: IncomingRequest| !request.text.starts_with('/'))
        .endpoint(move |bot: Bot, request: IncomingRequest| {
            let deps = deps.clone();
            async move {
                log::info!("Incoming request: {}", request.summary());
                let delivery = TelegramDelivery::new(bot);

                if let Err(e) = handle_link_message(&delivery, &deps.pipeline, deps.download_delay, &request).await {
                    log::error!("❌ Unhandled error while processing {}: {:?}", request.summary(), e);
                }
                Ok(())
            }
        })
}
