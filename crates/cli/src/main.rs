//! Switchyard CLI: the main entry point.
//!
//! Commands:
//! - `init`: Write the default config file
//! - `ask`: Route a single question and print the answer
//! - `chat`: Interactive question loop
//! - `serve`: Start the HTTP gateway
//! - `route`: Offline keyword routing dry run
//! - `actors`: List the configured roster

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "switchyard",
    about = "Switchyard: supervisor-routed multi-agent question answering",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Ask a single question
    Ask {
        /// The question
        #[arg(short, long)]
        message: String,

        /// Session to continue (a fresh one is used otherwise)
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Interactive mode: one fresh session per question
    Chat,

    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show which actor the keyword table would pick, without a backend
    Route {
        /// The question
        #[arg(short, long)]
        message: String,
    },

    /// List the configured actors
    Actors,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init { force } => commands::init::run(force).await?,
        Commands::Ask { message, session } => commands::ask::run(message, session).await?,
        Commands::Chat => commands::chat::run().await?,
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Route { message } => commands::route::run(message).await?,
        Commands::Actors => commands::actors::run().await?,
    }

    Ok(())
}
