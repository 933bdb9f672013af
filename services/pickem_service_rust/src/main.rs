use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use pickem_core::db::{create_pool, DbPoolConfig, PgPickemStore};
use pickem_core::{generate_picks, Collaborators};
use pickem_service_rust::{Cli, Config, ReportFileSink};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Database
    let pool_config = DbPoolConfig::from_env_with_defaults(DbPoolConfig::default());
    let pool = create_pool(config.require_database_url()?, &pool_config).await?;
    let store = PgPickemStore::new(pool);

    // Reports
    let output_dir = cli
        .output_dir
        .clone()
        .unwrap_or_else(|| config.output_dir.clone());
    let sink = ReportFileSink::new(output_dir);

    let request = cli.request(config.superdog_fallback);
    let aggregate = generate_picks(&request, Collaborators::from_store(&store, &sink)).await?;

    info!(
        "Done: pick set {} ({} picks) for {} week {}",
        aggregate.id,
        aggregate.pick_count(),
        aggregate.season,
        aggregate.week
    );

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&aggregate)?);
    }

    Ok(())
}
