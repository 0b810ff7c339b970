use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "restraint-cli", version, about = "Restraint CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Counter control
    Counter {
        #[command(subcommand)]
        action: commands::counter::CounterAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Restricted-site checks
    Sites {
        #[command(subcommand)]
        action: commands::sites::SitesAction,
    },
    /// Feed limiter helpers
    Feed {
        #[command(subcommand)]
        action: commands::feed::FeedAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Counter { action } => commands::counter::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Sites { action } => commands::sites::run(action),
        Commands::Feed { action } => commands::feed::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
