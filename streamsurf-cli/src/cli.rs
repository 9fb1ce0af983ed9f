use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "streamsurf",
    author,
    version,
    about = "Follow Twitch channels, browse their VODs and hand them to a player",
    long_about = None
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, env = "STREAMSURF_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Newline-separated channel list, added to the configured channels
    #[arg(long, global = true)]
    pub channels_file: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the latest broadcast of every followed channel
    #[command(visible_alias = "f")]
    Follow {
        /// Print the list instead of prompting for a selection
        #[arg(short, long)]
        list: bool,

        /// Output format for --list
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
        output: OutputFormat,
    },

    /// Browse the latest VODs of a channel
    #[command(visible_alias = "v")]
    Vods {
        /// Channel name or channel URL
        channel: String,

        /// Print the list instead of prompting for a selection
        #[arg(short, long)]
        list: bool,

        /// Output format for --list
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
        output: OutputFormat,
    },

    /// Play the live stream or most recent VOD of a channel
    #[command(visible_alias = "o")]
    Open {
        /// Channel name or channel URL
        channel: String,
    },

    /// Refresh the follow list periodically until interrupted
    Watch {
        /// Seconds between refreshes
        #[arg(short, long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(5..))]
        interval: u64,
    },

    /// Configuration management
    Config {
        /// Show the effective configuration
        #[arg(long)]
        show: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// One formatted line per record
    Pretty,
    /// JSON array of records
    Json,
}
