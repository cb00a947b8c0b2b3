// ABOUTME: Entry point for the tokenvault binary
// ABOUTME: Parses the command line, initialises tracing and dispatches subcommands

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tokenvault_cli::{migrate, run_server, Config};

#[derive(Parser)]
#[command(name = "tokenvault")]
#[command(about = "Tokenvault - OAuth2 offline-access token coordinator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        #[arg(long, help = "Listen port (overrides PORT)")]
        port: Option<u16>,
        #[arg(long, help = "Listen address (overrides TOKENVAULT_HOST)")]
        host: Option<String>,
        #[arg(long, help = "SQLite database URL (overrides DATABASE_URL)")]
        database_url: Option<String>,
        #[arg(long, help = "Use http redirect URIs for local development")]
        dev: bool,
    },
    /// Apply database migrations and exit
    Migrate {
        #[arg(long, help = "SQLite database URL (overrides DATABASE_URL)")]
        database_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;

    match cli.command {
        Commands::Serve {
            port,
            host,
            database_url,
            dev,
        } => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(database_url) = database_url {
                config.database_url = database_url;
            }
            if dev {
                config.oauth.dev_mode = true;
            }
            run_server(config).await
        }
        Commands::Migrate { database_url } => {
            let database_url = database_url.unwrap_or(config.database_url);
            migrate(&database_url).await
        }
    }
}
