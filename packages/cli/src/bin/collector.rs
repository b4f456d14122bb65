use clap::{Parser, Subcommand};
use std::process;

use collector_cli::{init_tracing, run_migrations, run_server, Config};

#[derive(Parser)]
#[command(name = "collector")]
#[command(about = "Collector - entry, run, and report tracking server")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port to listen on (overrides PORT)
        #[arg(long)]
        port: Option<u16>,
        /// Address to bind (overrides HOST)
        #[arg(long)]
        host: Option<std::net::IpAddr>,
    },
    /// Apply database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() {
    // Load .env file
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Serve { port, host } => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(host) = host {
                config.host = host;
            }
            run_server(config).await
        }
        Commands::Migrate => run_migrations(&config).await,
    };

    if let Err(e) = result {
        tracing::error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
