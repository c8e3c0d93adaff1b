//! Chatbot coroutine Telegram bot
//!
//! Main application entry point

use std::sync::Arc;
use anyhow::Context as _;
use serde_json::Value;
use teloxide::{prelude::*, types::Update};
use teloxide::dispatching::UpdateHandler;
use teloxide::utils::command::BotCommands as TeloxideBotCommands;
use tracing::{debug, info, warn};

use chatbot_coroutine::{
    config::Settings,
    conversations,
    session::{Scheduler, SessionReaper},
    storage,
    transport::TelegramTransport,
    utils::logging,
};

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new().context("loading settings")?;
    settings.validate()?;

    // Initialize logging
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", chatbot_coroutine::info());

    info!(backend = ?settings.storage.backend, "Connecting to storage...");
    let storage = storage::connect(&settings.storage).await?;

    let transport = TelegramTransport::from_settings(&settings.bot)?;
    let bot = transport.bot().clone();

    let conversation = conversations::by_name(&settings.bot.conversation)
        .with_context(|| format!("unknown conversation {}", settings.bot.conversation))?;
    info!(conversation = %settings.bot.conversation, "Conversation loaded");

    let scheduler = Arc::new(Scheduler::new(conversation, storage, Arc::new(transport)));

    let mut reaper = SessionReaper::from_config(scheduler.registry().clone(), &settings.sessions);
    reaper.start();

    let handler = create_handler();

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![scheduler])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd);
        })
        .enable_ctrlc_handler()
        .build();

    info!("Starting bot with polling mode...");
    dispatcher.dispatch().await;

    reaper.stop();
    info!("Bot has been shut down.");

    Ok(())
}

/// Create the main update handler
fn create_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    use teloxide::dispatching::UpdateFilterExt;

    dptree::entry().branch(
        Update::filter_message()
            .branch(
                dptree::entry()
                    .filter_command::<BotCommands>()
                    .endpoint(handle_commands),
            )
            .branch(dptree::endpoint(handle_messages)),
    )
}

#[derive(TeloxideBotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Conversation bot commands")]
enum BotCommands {
    #[command(description = "Show help information")]
    Help,
    #[command(description = "Abandon the current conversation")]
    Reset,
    #[command(description = "Show the state of your conversation")]
    Status,
}

/// Handle bot commands
async fn handle_commands(
    bot: Bot,
    msg: Message,
    cmd: BotCommands,
    scheduler: Arc<Scheduler>,
) -> HandlerResult {
    let user_id = msg.chat.id.0;

    match cmd {
        BotCommands::Help => {
            bot.send_message(msg.chat.id, BotCommands::descriptions().to_string()).await?;
        }
        BotCommands::Reset => {
            let text = if scheduler.reset(user_id).await {
                "Conversation reset."
            } else {
                "Nothing to reset."
            };
            bot.send_message(msg.chat.id, text).await?;
        }
        BotCommands::Status => {
            let text = match scheduler.snapshot(user_id) {
                Some(snapshot) => format!(
                    "Phase: {}\nQueued messages: {}\nLast activity: {}",
                    snapshot.phase,
                    snapshot.queue_depth,
                    snapshot.last_activity.format("%Y-%m-%d %H:%M:%S UTC")
                ),
                None => "No conversation yet.".to_string(),
            };
            bot.send_message(msg.chat.id, text).await?;
        }
    }

    Ok(())
}

/// Feed plain messages into the user's conversation
async fn handle_messages(msg: Message, scheduler: Arc<Scheduler>) -> HandlerResult {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let user_id = msg.chat.id.0;

    // Failures are reported by the scheduler's error sink.
    let outcome = scheduler.respond(user_id, Value::String(text.to_string())).await;
    debug!(user_id = user_id, idle = outcome.is_idle(), "Message handled");

    Ok(())
}
