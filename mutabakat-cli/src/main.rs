use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "mutabakat", about = "Notification tools for the mutabakat reconciliation app")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage configuration
    Config(commands::config::ConfigArgs),
    /// Follow the live notification channel
    Listen(commands::listen::ListenArgs),
    /// Query and exercise the push registry
    Push(commands::push::PushArgs),
    /// Render a push payload as the background agent would
    Render(commands::render::RenderArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Config(args) => commands::config::run(args),
        Commands::Listen(args) => commands::listen::run(args).await,
        Commands::Push(args) => commands::push::run(args).await,
        Commands::Render(args) => commands::render::run(args).await,
    }
}
