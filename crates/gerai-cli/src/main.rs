mod cmd;
mod locate;
mod output;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, subscribers::SubscribersSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "gerai",
    about = "Campus gerai open/closed tracker: chat bot, HTTP API and admin tools",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: nearest gerai.yaml upward from cwd)
    #[arg(long, global = true, env = "GERAI_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default gerai.yaml if none exists
    Init,

    /// Run the HTTP API, the Telegram bot and the auto-close scheduler
    Serve {
        /// Port for the HTTP API
        #[arg(long, env = "PORT", default_value = "3000")]
        port: u16,

        /// Telegram bot token
        #[arg(long, env = "GERAI_BOT_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Bearer token required by the API's voting, admin and subscriber routes
        #[arg(long, env = "GERAI_API_TOKEN", hide_env_values = true)]
        api_token: Option<String>,

        /// Run the HTTP API only
        #[arg(long)]
        no_bot: bool,
    },

    /// List the configured stalls
    Stalls,

    /// Show operating hours and the next auto-close
    Hours,

    /// Manage the persisted subscriber list
    Subscribers {
        #[command(subcommand)]
        subcommand: SubscribersSubcommand,
    },

    /// Inspect and validate the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let config_path = locate::resolve_config(cli.config.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&config_path),
        Commands::Serve {
            port,
            token,
            api_token,
            no_bot,
        } => cmd::serve::run(&config_path, port, token, api_token, no_bot),
        Commands::Stalls => cmd::stalls::run(&config_path, cli.json),
        Commands::Hours => cmd::hours::run(&config_path, cli.json),
        Commands::Subscribers { subcommand } => {
            cmd::subscribers::run(&config_path, subcommand, cli.json)
        }
        Commands::Config { subcommand } => cmd::config::run(&config_path, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
