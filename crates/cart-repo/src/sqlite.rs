use async_trait::async_trait;
use cart_types::domain::cart::{CartItem, CartSnapshot};
use cart_types::ports::cart_repository::{CartRepository, RepoError, SNAPSHOT_VERSION};
use chrono::Utc;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;

pub struct SqliteCartRepo {
    pool: SqlitePool,
    key: String,
}

#[derive(FromRow)]
struct DbSnapshot {
    version: i64,
    items_json: String,
}

impl DbSnapshot {
    fn into_snapshot(self) -> Result<CartSnapshot, RepoError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(RepoError::VersionMismatch {
                found: self.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        let items: Vec<CartItem> = serde_json::from_str(&self.items_json)
            .map_err(|e| RepoError::Serialization(e.to_string()))?;
        Ok(CartSnapshot { items })
    }
}

impl SqliteCartRepo {
    pub async fn new(database_url: &str, key: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        let pool = SqlitePool::connect_with(options).await?;

        let ddl = include_str!("../migrations/0001_create_cart_snapshots.sql");
        sqlx::query(ddl).execute(&pool).await?;
        tracing::debug!(url = %database_url, %key, "cart snapshot table ready");

        Ok(Self {
            pool,
            key: key.to_string(),
        })
    }
}

#[async_trait]
impl CartRepository for SqliteCartRepo {
    async fn save(&self, snapshot: &CartSnapshot) -> Result<(), RepoError> {
        let items_json = serde_json::to_string(&snapshot.items)
            .map_err(|e| RepoError::Serialization(e.to_string()))?;
        sqlx::query(
            "INSERT INTO cart_snapshots (snapshot_key, version, items_json, saved_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(snapshot_key) DO UPDATE SET
                version = excluded.version,
                items_json = excluded.items_json,
                saved_at = excluded.saved_at",
        )
        .bind(&self.key)
        .bind(SNAPSHOT_VERSION)
        .bind(items_json)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::DbError(e.to_string()))?;
        Ok(())
    }

    async fn load(&self) -> Result<Option<CartSnapshot>, RepoError> {
        let row: Option<DbSnapshot> = sqlx::query_as(
            "SELECT version, items_json FROM cart_snapshots WHERE snapshot_key = ?",
        )
        .bind(&self.key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::DbError(e.to_string()))?;
        row.map(|r| r.into_snapshot()).transpose()
    }
}

#[cfg(test)]
impl SqliteCartRepo {
    pub(crate) async fn force_version(&self, version: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE cart_snapshots SET version = ? WHERE snapshot_key = ?")
            .bind(version)
            .bind(&self.key)
            .execute(&self.pool)
            .await
            .map(|_| ())
    }
}
