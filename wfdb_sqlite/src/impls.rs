use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use std::sync::Arc;
use wfcore::platform::{ConnectorOption, PlatformUrl};

use crate::SqliteBackend;

impl PlatformUrl for SqliteBackend {
    fn url(&self) -> &str {
        self.url.as_ref()
    }
}

impl SqliteBackend {
    pub async fn connect(opts: ConnectorOption) -> Result<SqliteBackend, sqlx::Error> {
        if opts.auto_create_db && !Sqlite::database_exists(&opts.url).await.unwrap_or(false) {
            log::warn!("sqlite database {} does not exist; creating...", &opts.url);
            Sqlite::create_database(&opts.url).await?
        }

        let pool = SqlitePool::connect(&opts.url).await?;
        Ok(SqliteBackend {
            pool: Arc::new(pool),
            url: opts.url,
        })
    }

    pub async fn from_url(url: &str) -> Result<SqliteBackend, sqlx::Error> {
        Self::connect(ConnectorOption::from(url)).await
    }

    pub async fn migrate(self) -> Result<Self, sqlx::Error> {
        sqlx::migrate!("migrations/wflow").run(&*self.pool).await?;
        Ok(self)
    }

    /// Connects, then applies the migrations.
    pub async fn wf(opts: ConnectorOption) -> Result<Self, sqlx::Error> {
        Self::connect(opts).await?.migrate().await
    }
}

/// Maps a unique violation to `Ok(false)`, i.e. "already present".
pub(crate) fn inserted(
    result: Result<sqlx::sqlite::SqliteQueryResult, sqlx::Error>,
) -> Result<bool, sqlx::Error> {
    match result {
        Ok(_) => Ok(true),
        Err(e) => {
            match e.as_database_error() {
                Some(db_e) if db_e.is_unique_violation() => Ok(false),
                _ => Err(e),
            }
        }
    }
}

mod binding;
mod definition;
mod history;
mod permission;
mod principal;
mod transition;

mod default_impl {
    use wfcore::platform::DefaultWfPlatform;
    use crate::SqliteBackend;

    impl DefaultWfPlatform for SqliteBackend {}
}
