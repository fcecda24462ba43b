#[cfg(not(any(feature = "memory", feature = "sqlite")))]
compile_error!("Enable a repo feature: `memory` or `sqlite`.");

use cart_types::domain::cart::CartSnapshot;
use cart_types::ports::cart_repository::{CartRepository, RepoError};

#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://cart.db";

/// Whichever snapshot store the enabled features and configuration select.
pub enum Repo {
    #[cfg(feature = "memory")]
    Memory(memory::InMemoryCartRepo),
    #[cfg(feature = "sqlite")]
    Sqlite(sqlite::SqliteCartRepo),
}

pub async fn build_repo(url: Option<&str>, key: &str) -> anyhow::Result<Repo> {
    Repo::build_repo(url, key).await
}

impl Repo {
    #[cfg(all(feature = "memory", not(feature = "sqlite")))]
    pub async fn build_repo(_: Option<&str>, key: &str) -> anyhow::Result<Self> {
        Ok(Repo::Memory(memory::InMemoryCartRepo::with_key(key)))
    }

    #[cfg(all(feature = "sqlite", not(feature = "memory")))]
    pub async fn build_repo(database_url: Option<&str>, key: &str) -> anyhow::Result<Self> {
        let url = database_url.unwrap_or(DEFAULT_DATABASE_URL);
        let sqlite = sqlite::SqliteCartRepo::new(url, key).await?;
        Ok(Repo::Sqlite(sqlite))
    }

    // With both adapters compiled in, the cart is kept on disk; the memory
    // adapter only backs the in-memory order gateway.
    #[cfg(all(feature = "sqlite", feature = "memory"))]
    pub async fn build_repo(database_url: Option<&str>, key: &str) -> anyhow::Result<Self> {
        let url = database_url.unwrap_or(DEFAULT_DATABASE_URL);
        Ok(Repo::Sqlite(sqlite::SqliteCartRepo::new(url, key).await?))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            #[cfg(feature = "memory")]
            Repo::Memory(_) => "memory",
            #[cfg(feature = "sqlite")]
            Repo::Sqlite(_) => "sqlite",
        }
    }
}

#[async_trait::async_trait]
impl CartRepository for Repo {
    async fn save(&self, snapshot: &CartSnapshot) -> Result<(), RepoError> {
        match self {
            #[cfg(feature = "memory")]
            Repo::Memory(r) => r.save(snapshot).await,
            #[cfg(feature = "sqlite")]
            Repo::Sqlite(r) => r.save(snapshot).await,
        }
    }

    async fn load(&self) -> Result<Option<CartSnapshot>, RepoError> {
        match self {
            #[cfg(feature = "memory")]
            Repo::Memory(r) => r.load().await,
            #[cfg(feature = "sqlite")]
            Repo::Sqlite(r) => r.load().await,
        }
    }
}
