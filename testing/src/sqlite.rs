use wfdb_sqlite::SqliteBackend;

/// An in-memory backend with all migrations applied.
pub async fn create_sqlite_backend() -> anyhow::Result<SqliteBackend> {
    Ok(SqliteBackend::wf("sqlite::memory:".into()).await?)
}
