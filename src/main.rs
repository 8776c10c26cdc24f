use anyhow::Result;
use dotenvy::dotenv;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use tokgrab::cli::{Cli, Commands};
use tokgrab::core::config::{self, BotConfig, DeliveryMode};
use tokgrab::core::{init_logger, log_startup_configuration};
use tokgrab::download::links::normalize_url;
use tokgrab::download::{FetchSettings, RetrievalOutcome, RetrievalPipeline, YtDlpSource};
use tokgrab::telegram::handlers::too_large_message;
use tokgrab::telegram::{create_bot, run_polling, run_webhook, setup_bot_commands, HandlerDeps};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, configuration, bot creation).
#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Load environment variables from .env if present
    let _ = dotenv();

    // Log panics instead of losing them in a worker task
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
        if let Some(msg) = panic_info.payload().downcast_ref::<&str>() {
            log::error!("Panic message: {}", msg);
        }
    }));

    // Initialize logger (console + file)
    init_logger(&config::log_file_path())?;

    let config = BotConfig::from_env()?;

    match cli.command {
        Some(Commands::Run) | None => {
            run_bot(config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Fetch { url, output }) => run_cli_fetch(&config, &url, output).await,
        Some(Commands::Check) => run_check(&config).await,
    }
}

fn build_pipeline(config: &BotConfig) -> (Arc<YtDlpSource>, RetrievalPipeline) {
    let source = Arc::new(YtDlpSource::new(config.ytdl_bin.clone(), config.socket_timeout));
    let settings: FetchSettings = config.fetch_settings();
    let pipeline = RetrievalPipeline::new(source.clone(), settings);
    (source, pipeline)
}

/// Run the bot in the mode selected by configuration
async fn run_bot(config: BotConfig) -> Result<()> {
    log::info!("Starting tokgrab {}", env!("CARGO_PKG_VERSION"));
    log_startup_configuration(&config);

    tokio::fs::create_dir_all(&config.download_dir).await?;

    let (source, pipeline) = build_pipeline(&config);
    match source.version().await {
        Ok(version) => log::info!("yt-dlp version: {}", version),
        Err(e) => log::error!("yt-dlp is not usable, downloads will fail: {}", e),
    }

    let bot = create_bot(&config)?;
    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    let deps = HandlerDeps::new(Arc::new(pipeline), config.download_delay);

    match config.delivery_mode() {
        DeliveryMode::Webhook { url, port } => run_webhook(bot, deps, url, port).await,
        DeliveryMode::Polling => run_polling(bot, deps).await,
    }
}

/// Run the pipeline for one URL and keep the result in `output`
async fn run_cli_fetch(config: &BotConfig, url: &str, output: PathBuf) -> Result<ExitCode> {
    let url = normalize_url(url.trim());
    println!("🎬 Fetching {}", url);

    tokio::fs::create_dir_all(&config.download_dir).await?;
    let (_, pipeline) = build_pipeline(config);

    match pipeline.retrieve(&url).await {
        RetrievalOutcome::Success(video) => {
            let size = video.size;
            let path = video.persist(&output).await?;
            println!("✅ Saved {} ({} bytes)", path.display(), size);
            Ok(ExitCode::SUCCESS)
        }
        RetrievalOutcome::TooLarge { size } => {
            println!("{} ({} bytes)", too_large_message(config.max_file_size_mb), size);
            Ok(ExitCode::FAILURE)
        }
        RetrievalOutcome::Failed(failure) => {
            println!("{}", failure.user_message(&url));
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Print the yt-dlp version and the effective configuration
async fn run_check(config: &BotConfig) -> Result<ExitCode> {
    log_startup_configuration(config);

    let (source, _) = build_pipeline(config);
    match source.version().await {
        Ok(version) => {
            println!("✅ yt-dlp {}", version);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            println!("❌ yt-dlp check failed: {}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}
