mod commands;
mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use commands::Context;
use crew_core::config::Config;
use crew_core::settings::SettingsManager;
use crew_telemetry::logging::{init_logging, LogFormat};

/// crew-studio CLI -- build an AI crew, run it, and watch it work.
#[derive(Parser)]
#[command(name = "crew", version, about)]
struct Cli {
    /// Backend REST base, including the `/api` prefix.
    #[arg(long, global = true, env = "CREW_API_URL")]
    api_url: Option<String>,

    /// Config file (default: ~/.config/crew-studio/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Settings file holding the API key (default: ~/.config/crew-studio/settings.toml).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Log format on stderr: `human` or `json` (one object per line).
    #[arg(long, global = true, env = "CREW_LOG_FORMAT", default_value = "human")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the stored API key and preferences.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// List the models the backend offers.
    Models,

    /// List the tools agents can use.
    Tools,

    /// Create a session, configure the crew and stream the run.
    Run {
        /// TOML crew file with agents, tasks, topic and model.
        crew_file: Option<PathBuf>,
        /// Topic for the run (overrides the crew file).
        #[arg(short, long)]
        topic: Option<String>,
        /// Model id (overrides the crew file).
        #[arg(short, long)]
        model: Option<String>,
        /// Add the researcher/writer/editor preset crew.
        #[arg(long)]
        defaults: bool,
    },

    /// Print the final result of a session.
    Result {
        session_id: String,
    },

    /// Print per-agent statistics of a session.
    Stats {
        session_id: String,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Show the stored key (masked) and preferences.
    Show,
    /// Store a key without validating it.
    SetKey { key: String },
    /// Validate a key (or the stored one) against the backend and store it.
    Validate { key: Option<String> },
    /// Forget the stored key.
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
        config.validate()?;
    }

    init_logging("crew-cli", &config.general.log_level, cli.log_format);

    let settings = match cli.settings {
        Some(path) => SettingsManager::new(path),
        None => SettingsManager::default_path(),
    };
    let ctx = Context::new(config, settings);

    match cli.command {
        Commands::Settings { action } => match action {
            SettingsAction::Show => commands::settings::show(&ctx),
            SettingsAction::SetKey { key } => commands::settings::set_key(&ctx, &key),
            SettingsAction::Validate { key } => {
                commands::settings::validate(&ctx, key.as_deref()).await
            }
            SettingsAction::Clear => commands::settings::clear(&ctx),
        },
        Commands::Models => commands::catalog::models(&ctx).await,
        Commands::Tools => commands::catalog::tools(&ctx).await,
        Commands::Run {
            crew_file,
            topic,
            model,
            defaults,
        } => {
            let opts = commands::run::RunOptions {
                crew_file,
                topic,
                model,
                defaults,
            };
            commands::run::run(&ctx, opts).await
        }
        Commands::Result { session_id } => commands::session::result(&ctx, &session_id).await,
        Commands::Stats { session_id } => commands::session::stats(&ctx, &session_id).await,
    }
}
