use crate::config::DatabaseConfig;
use crate::error::AppResult;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;

pub type DbPool = DatabaseConnection;

pub async fn create_pool(config: &DatabaseConfig) -> AppResult<DbPool> {
    let mut opts = ConnectOptions::new(config.url.clone());
    opts.max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    let pool = Database::connect(opts).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &DbPool) -> AppResult<()> {
    Migrator::up(pool, None).await?;
    Ok(())
}

/// 测试用: 内存 SQLite + 迁移
#[cfg(test)]
pub async fn test_pool() -> DbPool {
    // 内存库每个连接独立，只能使用单连接并保持常驻
    let mut opts = ConnectOptions::new("sqlite::memory:".to_string());
    opts.max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let pool = Database::connect(opts).await.expect("connect sqlite memory");
    run_migrations(&pool).await.expect("run migrations");
    pool
}

/// 测试用: 临时目录中的文件 SQLite，多连接，用于并发场景
///
/// 返回的 `TempDir` 需在测试期间保持存活。
#[cfg(test)]
pub async fn file_test_pool(max_connections: u32) -> (DbPool, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let config = DatabaseConfig {
        url: format!("sqlite://{}?mode=rwc", dir.path().join("lottery.db").display()),
        max_connections,
    };
    let pool = create_pool(&config).await.expect("connect sqlite file");
    run_migrations(&pool).await.expect("run migrations");
    (pool, dir)
}
