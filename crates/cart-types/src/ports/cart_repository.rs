use async_trait::async_trait;

use crate::domain::cart::CartSnapshot;

/// Bumped whenever the persisted item layout changes.
pub const SNAPSHOT_VERSION: i64 = 1;

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("db error: {0}")]
    DbError(String),

    #[error("snapshot encoding error: {0}")]
    Serialization(String),

    #[error("snapshot version {found} is not supported (expected {expected})")]
    VersionMismatch { found: i64, expected: i64 },
}

#[async_trait]
pub trait CartRepository: Send + Sync + 'static {
    async fn save(&self, snapshot: &CartSnapshot) -> Result<(), RepoError>;
    async fn load(&self) -> Result<Option<CartSnapshot>, RepoError>;
}
