//! db-export - export query results from PostgreSQL or SQLite to CSV, XLSX or JSON.

use colored::Colorize;
use db_export::app::App;
use db_export::cli::{Cli, Command};
use db_export::commands::{handle_export, handle_presets};
use db_export::config::Config;
use db_export::error::{ExportError, Result};
use db_export::persistence::StateDb;
use db_export::prompt::Prompter;
use db_export::{db, logging};
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse_args();

    if cli.is_interactive() {
        logging::init_file_logging();
    } else {
        logging::init_stderr_logging();
    }

    if let Err(e) = run(cli).await {
        error!("{e}");
        eprintln!("{}", e.to_string().bright_red());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    let state = match &cli.state_db {
        Some(path) => StateDb::open(path).await?,
        None => StateDb::open_default().await?,
    };

    let result = dispatch(&cli, &config, &state).await;
    state.close().await;
    result
}

async fn dispatch(cli: &Cli, config: &Config, state: &StateDb) -> Result<()> {
    let mut stdout = std::io::stdout();

    // Preset management never touches the source database.
    if let Some(Command::Presets(command)) = &cli.command {
        return handle_presets(command, state, &mut stdout).await;
    }

    let connection = config
        .resolve_connection(cli.to_connection_config()?, cli.connection_name())?
        .ok_or_else(|| {
            ExportError::config(
                "No database connection configured. Pass a connection URL, use -c NAME, \
                 or set DATABASE_URL.",
            )
        })?;
    info!("Connecting to {}", connection.display_string());
    let client = db::connect(&connection).await?;

    let result = match &cli.command {
        Some(Command::Export(args)) => {
            handle_export(args, client.as_ref(), state, &config.export, &mut stdout)
                .await
                .map(|_| ())
        }
        _ => {
            let prompter = Prompter::new(std::io::stdin().lock(), stdout);
            App::new(client.as_ref(), state, prompter)
                .with_default_output_dir(config.export.output_dir.clone())
                .run()
                .await
        }
    };

    client.close().await?;
    result
}
