use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use std::env;
use tracing::info;

pub async fn setup_database() -> anyhow::Result<SqlitePool> {
    let db_url = env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://site-media.db?mode=rwc".to_string());

    info!("📂 Database: {}", db_url);

    let pool = SqlitePoolOptions::new()
        .max_connections(16)
        .connect(&db_url)
        .await?;

    info!("✅ Database connected successfully");

    info!("🔄 Running migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}
