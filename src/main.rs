use clap::Parser;
use dotenvy::dotenv;
use ecotrade::{
    cli::{self, Cli},
    config::{database, marketplace},
    core::account,
    errors::Result,
};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) if e.is_user_facing() => {
            eprintln!("✗ {e}");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("Command failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<String> {
    // 3. Load the marketplace configuration
    let config = match &cli.config {
        Some(path) => marketplace::load_config(path)?,
        None => marketplace::load_default_config()?,
    };

    // 4. Initialize the database
    let url = database::get_database_url(&config.database)?;
    let db = database::create_connection(&url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db).await?;

    // 5. Seed the administrator (no-op once it exists)
    account::seed_admin(&db, &config.admin).await?;

    cli::execute(&db, &config, cli.command).await
}
