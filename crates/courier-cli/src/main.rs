use anyhow::Result;
use clap::{Parser, Subcommand};
use courier_core::{ConsoleConfig, TraceKind};
use courier_sdk::TokenStore;

mod commands;

#[derive(Parser)]
#[command(name = "courier", about = "Admin console for the Courier messaging server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<String>,

    /// Admin API base URL (overrides the config file)
    #[arg(long, global = true)]
    api_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Store the admin token used for API requests
    Login {
        /// Admin token
        #[arg(long)]
        token: String,
    },
    /// Forget the stored admin token
    Logout,
    /// Stream live trace events for a user, channel or publication
    Trace {
        /// What to trace
        #[arg(value_name = "user|channel|publication")]
        kind: TraceKind,
        /// User ID, channel name or publication channel
        entity: String,
        /// Only show records matching this expression
        #[arg(long)]
        filter: Option<String>,
        /// Reconnect with backoff when the server closes the stream
        #[arg(long)]
        reconnect: bool,
        /// Print records as compact JSON, one per line
        #[arg(long)]
        raw: bool,
    },
    /// Filter expression operations
    Filter {
        #[command(subcommand)]
        command: FilterCommands,
    },
}

#[derive(Subcommand)]
enum FilterCommands {
    /// Compile a filter expression and optionally test it against a record
    Check {
        /// Filter expression
        expr: String,
        /// JSON record to evaluate the expression against
        #[arg(long)]
        sample: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Records go to stdout, diagnostics to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "courier=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = ConsoleConfig::load(cli.config.as_deref())?;
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }
    let store = TokenStore::from_override(config.credentials_path.as_deref());

    match cli.command {
        Commands::Login { token } => {
            commands::auth::login(&store, &token)?;
        }
        Commands::Logout => {
            commands::auth::logout(&store)?;
        }
        Commands::Trace {
            kind,
            entity,
            filter,
            reconnect,
            raw,
        } => {
            commands::trace::run(
                &config,
                &store,
                commands::trace::TraceArgs {
                    kind,
                    entity,
                    filter,
                    reconnect,
                    raw,
                },
            )
            .await?;
        }
        Commands::Filter { command } => match command {
            FilterCommands::Check { expr, sample } => {
                commands::filter::check(&expr, sample.as_deref())?;
            }
        },
    }

    Ok(())
}
