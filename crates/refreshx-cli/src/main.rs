use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "refreshx", version, about = "RefreshX break and exercise tracker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Today's break schedule
    Schedule {
        #[command(subcommand)]
        action: commands::schedule::ScheduleAction,
    },
    /// Log exercise sessions
    Exercise {
        #[command(subcommand)]
        action: commands::exercise::ExerciseAction,
    },
    /// Log breaks
    Break {
        #[command(subcommand)]
        action: commands::breaks::BreakAction,
    },
    /// Progress, weekly stats and streak
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Browse exercises and articles
    Catalog {
        #[command(subcommand)]
        action: commands::catalog::CatalogAction,
    },
    /// In-app notifications
    Inbox {
        #[command(subcommand)]
        action: commands::inbox::InboxAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Schedule { action } => commands::schedule::run(action),
        Commands::Exercise { action } => commands::exercise::run(action),
        Commands::Break { action } => commands::breaks::run(action),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Catalog { action } => commands::catalog::run(action),
        Commands::Inbox { action } => commands::inbox::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
