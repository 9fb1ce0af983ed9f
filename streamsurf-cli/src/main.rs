mod cli;
mod commands;
mod config;
mod error;
mod menu;
mod output;
mod player;

use crate::{
    cli::{Args, Commands, OutputFormat},
    commands::CommandExecutor,
    config::AppConfig,
    error::Result,
};
use clap::Parser;
#[cfg(feature = "colored-output")]
use colored::*;
use std::{io::IsTerminal, process, time::Duration};
use tracing::{Level, debug, error};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    #[cfg(feature = "colored-output")]
    if args.no_color {
        colored::control::set_override(false);
    }
    let json_output = matches!(
        &args.command,
        Commands::Follow {
            output: OutputFormat::Json,
            ..
        } | Commands::Vods {
            output: OutputFormat::Json,
            ..
        }
    );

    if let Err(e) = run(args).await {
        if json_output {
            let error_json = serde_json::json!({
                "status": "error",
                "message": e.to_string(),
            });
            println!("{error_json}");
        } else {
            error!("Application error: {}", e);
            #[cfg(feature = "colored-output")]
            {
                eprintln!("{} {}", "Error:".red().bold(), e);
            }
            #[cfg(not(feature = "colored-output"))]
            {
                eprintln!("Error: {}", e);
            }
        }
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    init_logging(args.verbose, args.quiet);

    if let Commands::Completions { shell } = args.command {
        use clap::CommandFactory;
        use clap_complete::generate;

        let mut cmd = Args::command();
        let bin_name = cmd.get_name().to_string();
        generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
        return Ok(());
    }

    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(path) = args.channels_file {
        config.channels_file = Some(path);
    }
    debug!(?config, "Effective configuration");

    if let Commands::Config { show } = args.command {
        if show {
            println!("{}", config.show()?);
        } else {
            let path = args
                .config
                .or_else(AppConfig::default_path)
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<no config directory>".to_string());
            println!("Config file: {path}");
            println!("Use --show to display the effective configuration");
        }
        return Ok(());
    }

    let channels = config.resolve_channels()?;
    let colored = !args.no_color && std::io::stdout().is_terminal();
    let executor = CommandExecutor::new(config, channels, colored, !args.quiet)?;

    match args.command {
        Commands::Follow { list, output } => executor.follow(list, output).await,
        Commands::Vods {
            channel,
            list,
            output,
        } => executor.vods(&channel, list, output).await,
        Commands::Open { channel } => executor.open(&channel).await,
        Commands::Watch { interval } => executor.watch(Duration::from_secs(interval)).await,
        Commands::Config { .. } | Commands::Completions { .. } => Ok(()),
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(verbose),
        )
        .init();
}
