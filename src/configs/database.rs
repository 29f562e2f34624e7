use crate::item::repo::DbPool;
use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection};
use diesel::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use r2d2::Pool;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

const DEFAULT_POOL_SIZE: u32 = 8;

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("failed to create database directory: {0}")]
    DirectoryError(#[from] std::io::Error),

    #[error("could not build connection pool: {0}")]
    PoolError(#[from] r2d2::Error),

    #[error("failed to run migrations: {0}")]
    MigrationError(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    url: String,
    pool_size: Option<u32>,
}

impl Config {
    pub fn new(url: impl Into<String>, pool_size: Option<u32>) -> Self {
        Self { url: url.into(), pool_size }
    }

    /// SQLite 데이터베이스 파일 경로
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn pool_size(&self) -> u32 {
        self.pool_size.unwrap_or(DEFAULT_POOL_SIZE)
    }
}

/// 커넥션을 풀에서 꺼낼 때마다 외래키 제약과 잠금 대기 시간을 설정한다.
#[derive(Debug)]
struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// 데이터베이스 연결 풀을 생성한다.
pub fn connect_to_database(db: &Config) -> Result<DbPool, DatabaseError> {
    if let Some(parent) = Path::new(db.url()).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let manager = ConnectionManager::<SqliteConnection>::new(db.url());
    let pool = Pool::builder()
        .max_size(db.pool_size())
        .test_on_check_out(true)
        .connection_customizer(Box::new(SqlitePragmas))
        .build(manager)?;

    Ok(pool)
}

/// 아직 적용되지 않은 마이그레이션을 실행한다.
pub fn run_migrations(pool: &DbPool) -> Result<(), DatabaseError> {
    let mut pooled = pool.get()?;
    let connection: &mut SqliteConnection = &mut pooled;
    let applied = connection.run_pending_migrations(MIGRATIONS)
        .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;

    for version in applied {
        info!(%version, "migration applied");
    }
    Ok(())
}
