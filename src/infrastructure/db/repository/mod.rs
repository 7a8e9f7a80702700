use crate::domain::error::Result;
use crate::infrastructure::db::connection::init_db;
use sqlx::sqlite::SqlitePool;

mod entities;
mod sessions;
mod snippets;
mod users;

pub use snippets::TypeCount;

/// Data access for users, snippets and login sessions.
#[derive(Clone)]
pub struct HubRepository {
    pool: SqlitePool,
}

impl HubRepository {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = init_db(database_url).await?;
        Ok(Self { pool })
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
pub(crate) async fn in_memory() -> HubRepository {
    HubRepository::connect("sqlite::memory:")
        .await
        .expect("in-memory database")
}
