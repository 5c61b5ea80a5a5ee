use clipcast::config::AppConfig;
use clipcast::database;
use clipcast::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;

    // Initialize logging
    logging::init_logging(config.log_filter.as_deref())?;

    // Initialize database
    let pool = database::init_pool(&config.database_url).await?;
    database::run_migrations(&pool).await?;

    tracing::info!(
        records_endpoint = %config.records_endpoint,
        "clipcast initialized successfully"
    );

    Ok(())
}
