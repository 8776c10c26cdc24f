use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tokgrab")]
#[command(author, version, about = "Telegram bot that fetches TikTok videos and sends them back", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot (webhook mode when WEBHOOK_URL is set, long polling otherwise)
    Run,

    /// Download a single TikTok video without Telegram
    Fetch {
        /// TikTok video URL
        url: String,

        /// Directory to keep the MP4 in
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Show the yt-dlp version and the effective configuration
    Check,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_run() {
        let cli = Cli::try_parse_from(["tokgrab"]).unwrap();
        assert_eq!(cli.command, None);
    }

    #[test]
    fn test_fetch_arguments() {
        let cli = Cli::try_parse_from(["tokgrab", "fetch", "https://vm.tiktok.com/ZMabc/", "-o", "/tmp/out"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Fetch {
                url: "https://vm.tiktok.com/ZMabc/".to_string(),
                output: PathBuf::from("/tmp/out"),
            })
        );

        let cli = Cli::try_parse_from(["tokgrab", "fetch", "https://vm.tiktok.com/ZMabc/"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Fetch { output, .. }) if output == PathBuf::from(".")));
    }

    #[test]
    fn test_fetch_requires_url() {
        assert!(Cli::try_parse_from(["tokgrab", "fetch"]).is_err());
    }
}
