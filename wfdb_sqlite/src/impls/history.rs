use async_trait::async_trait;
use sqlx::{
    QueryBuilder,
    Sqlite,
};
use wfcore::{
    entity::EntityRef,
    error::BackendError,
    history::{
        History,
        HistoryOrder,
        HistoryRecord,
        traits::HistoryBackend,
    },
};

use crate::{
    SqliteBackend,
    chrono::Utc,
};

async fn append_history_sqlite(
    backend: &SqliteBackend,
    entity: &EntityRef,
    state_id: i64,
    transition_id: Option<i64>,
    actor_id: Option<i64>,
    comment: Option<&str>,
) -> Result<i64, BackendError> {
    let ts = Utc::now().timestamp();
    let id = sqlx::query(
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
    .bind(state_id)
    .bind(transition_id)
    .bind(actor_id)
    .bind(ts)
    .bind(comment)
    .execute(&*backend.pool)
    .await?
    .last_insert_rowid();
    Ok(id)
}

async fn list_history_sqlite(
    backend: &SqliteBackend,
    entity: &EntityRef,
    actor_id: Option<i64>,
    order: HistoryOrder,
) -> Result<History, BackendError> {
    let mut builder = QueryBuilder::<Sqlite>::new(r#"
SELECT
    id,
    kind,
    entity_id,
    state_id,
    transition_id,
    actor_id,
    created_ts,
    comment
FROM
    history
WHERE
    kind = "#
    );
    builder.push_bind(entity.kind.clone())
        .push(" AND entity_id = ")
        .push_bind(entity.id);
    if let Some(actor_id) = actor_id {
        builder.push(" AND actor_id = ")
            .push_bind(actor_id);
    }
    builder.push(match order {
        HistoryOrder::RecentFirst => " ORDER BY created_ts DESC, id DESC",
        HistoryOrder::Chronological => " ORDER BY created_ts ASC, id ASC",
    });
    let recs = builder.build_query_as::<HistoryRecord>()
        .fetch_all(&*backend.pool)
        .await?;
    Ok(recs.into())
}

#[async_trait]
impl HistoryBackend for SqliteBackend {
    async fn append_history(
        &self,
        entity: &EntityRef,
        state_id: i64,
        transition_id: Option<i64>,
        actor_id: Option<i64>,
        comment: Option<&str>,
    ) -> Result<i64, BackendError> {
        append_history_sqlite(
            &self,
            entity,
            state_id,
            transition_id,
            actor_id,
            comment,
        ).await
    }

    async fn list_history(
        &self,
        entity: &EntityRef,
        order: HistoryOrder,
    ) -> Result<History, BackendError> {
        list_history_sqlite(
            &self,
            entity,
            None,
            order,
        ).await
    }

    async fn list_history_for_actor(
        &self,
        entity: &EntityRef,
        actor_id: i64,
        order: HistoryOrder,
    ) -> Result<History, BackendError> {
        list_history_sqlite(
            &self,
            entity,
            Some(actor_id),
            order,
        ).await
    }
}
