use async_trait::async_trait;
use sqlx::{
    Row,
    Sqlite,
    Transaction,
};
use wfcore::{
    entity::EntityRef,
    error::BackendError,
    workflow::{
        StateChange,
        traits::TransitionBackend,
    },
};

use crate::{
    SqliteBackend,
    chrono::Utc,
};

/// Busy or locked, including their extended result codes.
fn is_lock_conflict(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(err) => err.code()
            .and_then(|code| code.parse::<i32>().ok())
            .map(|code| matches!(code & 0xff, 5 | 6))
            .unwrap_or(false),
        _ => false,
    }
}

async fn apply_state_change_sqlite(
    backend: &SqliteBackend,
    change: &StateChange,
) -> Result<bool, BackendError> {
    match apply_state_change_tx(backend, change).await {
        // a concurrent writer to the same entity won the race
        Err(err) if change.source_state_id.is_some() && is_lock_conflict(&err) => {
            log::debug!("{}: state change lost to a concurrent one: {err}", change.entity);
            Ok(false)
        }
        result => Ok(result?),
    }
}

async fn apply_state_change_tx(
    backend: &SqliteBackend,
    change: &StateChange,
) -> Result<bool, sqlx::Error> {
    let mut tx = backend.pool.begin().await?;
    match write_state_change(&mut tx, change).await {
        Ok(true) => {
            tx.commit().await?;
            Ok(true)
        }
        Ok(false) => {
            tx.rollback().await?;
            Ok(false)
        }
        Err(err) => {
            if let Err(e) = tx.rollback().await {
                log::warn!("rollback after failed state change: {e}");
            }
            Err(err)
        }
    }
}

async fn write_state_change(
    tx: &mut Transaction<'_, Sqlite>,
    change: &StateChange,
) -> Result<bool, sqlx::Error> {
    let entity = &change.entity;

    if let Some(expected) = change.source_state_id {
        let current: Option<i64> = sqlx::query(
            r#"
SELECT
    state_id
FROM
    object_state
WHERE
    kind = ?1 AND
    entity_id = ?2
            "#,
        )
        .bind(&entity.kind)
        .bind(entity.id)
        .fetch_optional(&mut **tx)
        .await?
        .map(|row| row.try_get("state_id"))
        .transpose()?;
        if current != expected {
            log::debug!(
                "state of {entity} changed from {expected:?} to {current:?}; \
                abandoning change",
            );
            return Ok(false);
        }
    }

    sqlx::query(
        r#"
INSERT INTO object_state (
    kind,
    entity_id,
    state_id
)
VALUES ( ?1, ?2, ?3 )
ON CONFLICT(kind, entity_id)
DO UPDATE SET
    state_id = ?3
        "#,
    )
    .bind(&entity.kind)
    .bind(entity.id)
    .bind(change.target_state_id)
    .execute(&mut **tx)
    .await?;

    // only the permissions the workflow is authoritative over are replaced
    let revoked = sqlx::query(
        r#"
DELETE FROM
    object_permission
WHERE
    kind = ?1 AND
    entity_id = ?2 AND
    permission_id IN (
        SELECT permission_id FROM workflow_permission WHERE workflow_id = ?3
    )
        "#,
    )
    .bind(&entity.kind)
    .bind(entity.id)
    .bind(change.workflow_id)
    .execute(&mut **tx)
    .await?
    .rows_affected();

    let granted = sqlx::query(
        r#"
INSERT OR IGNORE INTO object_permission (
    kind,
    entity_id,
    role_id,
    permission_id
)
SELECT
    ?1,
    ?2,
    role_id,
    permission_id
FROM
    state_permission_grant
WHERE
    state_id = ?3
        "#,
    )
    .bind(&entity.kind)
    .bind(entity.id)
    .bind(change.target_state_id)
    .execute(&mut **tx)
    .await?
    .rows_affected();
    log::trace!("{entity}: revoked {revoked} and granted {granted} object permissions");

    if let Some(history) = &change.history {
        let ts = Utc::now().timestamp();
        sqlx::query(
            r#"
INSERT INTO history (
    kind,
    entity_id,
    state_id,
    transition_id,
    actor_id,
    created_ts,
    comment
)
VALUES ( ?1, ?2, ?3, ?4, ?5, ?6, ?7 )
            "#,
        )
        .bind(&entity.kind)
        .bind(entity.id)
        .bind(change.target_state_id)
        .bind(history.transition_id)
        .bind(history.actor_id)
        .bind(ts)
        .bind(history.comment.as_deref())
        .execute(&mut **tx)
        .await?;
    }

    Ok(true)
}

async fn clear_state_sqlite(
    backend: &SqliteBackend,
    entity: &EntityRef,
) -> Result<bool, BackendError> {
    let mut tx = backend.pool.begin().await?;
    let cleared = sqlx::query(
        r#"
DELETE FROM
    object_state
WHERE
    kind = ?1 AND
    entity_id = ?2
        "#,
    )
    .bind(&entity.kind)
    .bind(entity.id)
    .execute(&mut *tx)
    .await?
    .rows_affected() > 0;
    for table in ["object_permission", "local_role"] {
        sqlx::query(&format!(
            "DELETE FROM {table} WHERE kind = ?1 AND entity_id = ?2"
        ))
        .bind(&entity.kind)
        .bind(entity.id)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(cleared)
}

#[async_trait]
impl TransitionBackend for SqliteBackend {
    async fn apply_state_change(
        &self,
        change: &StateChange,
    ) -> Result<bool, BackendError> {
        apply_state_change_sqlite(
            &self,
            change,
        ).await
    }

    async fn clear_state(
        &self,
        entity: &EntityRef,
    ) -> Result<bool, BackendError> {
        clear_state_sqlite(
            &self,
            entity,
        ).await
    }
}
