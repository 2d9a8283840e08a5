//! Server entry point.

use clap::Parser;
use personne_server::config::ServerConfig;
use personne_server::ServerError;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "personne_server", version, about = "Personne REST and GraphQL backend")]
struct Cli {
    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides `server.bind`.
    #[arg(long)]
    bind: Option<String>,
    /// Overrides `database.path` (`:memory:` for a throwaway store).
    #[arg(long)]
    database: Option<String>,
    /// Overrides `logging.level`.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("personne_server: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), ServerError> {
    let mut config = ServerConfig::load(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    if let Some(database) = cli.database {
        config.database.path = database;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.validate()?;

    personne_core::init_logging(&config.logging.level, config.logging.dir.as_deref())
        .map_err(ServerError::Logging)?;

    personne_server::serve(config).await
}
