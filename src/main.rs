use anyhow::{Context, Result};
use product_manager::api::server::ApiServer;
use product_manager::database_ops::db::Db;
use product_manager::database_ops::feed::FeedProvider;
use product_manager::util::env as env_util;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // --- logging -------------------------------------------------------------
    env_util::init_env();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .init();

    // --- DB connect ----------------------------------------------------------
    let db_url = env_util::db_url().context("no database URL configured")?;
    let max_connections: u32 = env_util::env_parse("DB_MAX_CONNECTIONS", 5u32);
    let db = Db::connect(&db_url, max_connections)
        .await
        .context("failed to connect to database")?;

    // --- one-shot feed ingestion ---------------------------------------------
    // Startup hook, not a recurring job: seeds the catalog only when the
    // store is empty. Failures stay here and never surface to a request.
    {
        let db = db.clone();
        tokio::spawn(async move {
            let provider = FeedProvider::from_env();
            match provider.run_once(&db).await {
                Ok(saved) => info!(saved, "startup feed ingestion finished"),
                Err(e) => error!(error = %e, "startup feed ingestion failed"),
            }
        });
    }

    // --- HTTP server ---------------------------------------------------------
    let server = ApiServer::from_env()?;
    server.run(db).await
}
