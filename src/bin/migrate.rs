use farmbox_api::{
    config::AppConfig,
    db::{create_pool, migrate},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,farmbox_api=debug".into()),
        )
        .init();

    let config = AppConfig::from_env()?;
    let pool = create_pool(&config.database_url, 1).await?;
    migrate(&pool).await?;
    tracing::info!("migrations applied");
    Ok(())
}
