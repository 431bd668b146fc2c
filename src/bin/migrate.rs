use marketplace_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
};
use tower_sessions_sqlx_store::PostgresStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;
    PostgresStore::new(pool).migrate().await?;
    println!("Migrations applied");
    Ok(())
}
