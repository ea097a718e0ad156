use async_trait::async_trait;
use sqlx::Row;
use wfcore::{
    entity::EntityRef,
    error::BackendError,
    workflow::{
        ObjectState,
        State,
        Workflow,
        traits::BindingBackend,
    },
};

use crate::SqliteBackend;

async fn get_type_binding_sqlite(
    backend: &SqliteBackend,
    kind: &str,
) -> Result<Option<Workflow>, BackendError> {
    let rec = sqlx::query_as::<_, Workflow>(
        r#"
SELECT
    workflow.id AS id,
    workflow.name AS name,
    workflow.initial_state_id AS initial_state_id
FROM
    type_binding
JOIN
    workflow ON type_binding.workflow_id == workflow.id
WHERE
    type_binding.kind = ?1
        "#,
    )
    .bind(kind)
    .fetch_optional(&*backend.pool)
    .await?;
    Ok(rec)
}

async fn set_type_binding_sqlite(
    backend: &SqliteBackend,
    kind: &str,
    workflow_id: i64,
) -> Result<(), BackendError> {
    sqlx::query(
        r#"
INSERT INTO type_binding (
    kind,
    workflow_id
)
VALUES ( ?1, ?2 )
ON CONFLICT(kind)
DO UPDATE SET
    workflow_id = ?2
        "#,
    )
    .bind(kind)
    .bind(workflow_id)
    .execute(&*backend.pool)
    .await?;
    Ok(())
}

async fn remove_type_binding_sqlite(
    backend: &SqliteBackend,
    kind: &str,
) -> Result<bool, BackendError> {
    let rows_affected = sqlx::query(
        r#"
DELETE FROM
    type_binding
WHERE
    kind = ?1
        "#,
    )
    .bind(kind)
    .execute(&*backend.pool)
    .await?
    .rows_affected();
    Ok(rows_affected > 0)
}

async fn list_type_bindings_sqlite(
    backend: &SqliteBackend,
    workflow_id: i64,
) -> Result<Vec<String>, BackendError> {
    let recs = sqlx::query(
        r#"
SELECT
    kind
FROM
    type_binding
WHERE
    workflow_id = ?1
ORDER BY
    kind
        "#,
    )
    .bind(workflow_id)
    .try_map(|row: sqlx::sqlite::SqliteRow| row.try_get("kind"))
    .fetch_all(&*backend.pool)
    .await?;
    Ok(recs)
}

async fn get_object_binding_sqlite(
    backend: &SqliteBackend,
    entity: &EntityRef,
) -> Result<Option<Workflow>, BackendError> {
    let rec = sqlx::query_as::<_, Workflow>(
        r#"
SELECT
    workflow.id AS id,
    workflow.name AS name,
    workflow.initial_state_id AS initial_state_id
FROM
    object_binding
JOIN
    workflow ON object_binding.workflow_id == workflow.id
WHERE
    object_binding.kind = ?1 AND
    object_binding.entity_id = ?2
        "#,
    )
    .bind(&entity.kind)
    .bind(entity.id)
    .fetch_optional(&*backend.pool)
    .await?;
    Ok(rec)
}

async fn set_object_binding_sqlite(
    backend: &SqliteBackend,
    entity: &EntityRef,
    workflow_id: i64,
) -> Result<(), BackendError> {
    sqlx::query(
        r#"
INSERT INTO object_binding (
    kind,
    entity_id,
    workflow_id
)
VALUES ( ?1, ?2, ?3 )
ON CONFLICT(kind, entity_id)
DO UPDATE SET
    workflow_id = ?3
        "#,
    )
    .bind(&entity.kind)
    .bind(entity.id)
    .bind(workflow_id)
    .execute(&*backend.pool)
    .await?;
    Ok(())
}

async fn remove_object_binding_sqlite(
    backend: &SqliteBackend,
    entity: &EntityRef,
) -> Result<bool, BackendError> {
    let rows_affected = sqlx::query(
        r#"
DELETE FROM
    object_binding
WHERE
    kind = ?1 AND
    entity_id = ?2
        "#,
    )
    .bind(&entity.kind)
    .bind(entity.id)
    .execute(&*backend.pool)
    .await?
    .rows_affected();
    Ok(rows_affected > 0)
}

async fn list_object_bindings_sqlite(
    backend: &SqliteBackend,
    workflow_id: i64,
) -> Result<Vec<EntityRef>, BackendError> {
    let recs = sqlx::query(
        r#"
SELECT
    kind,
    entity_id
FROM
    object_binding
WHERE
    workflow_id = ?1
ORDER BY
    id
        "#,
    )
    .bind(workflow_id)
    .try_map(|row: sqlx::sqlite::SqliteRow| Ok(EntityRef {
        kind: row.try_get("kind")?,
        id: row.try_get("entity_id")?,
    }))
    .fetch_all(&*backend.pool)
    .await?;
    Ok(recs)
}

async fn get_object_state_sqlite(
    backend: &SqliteBackend,
    entity: &EntityRef,
) -> Result<Option<State>, BackendError> {
    let rec = sqlx::query_as::<_, State>(
        r#"
SELECT
    state.id AS id,
    state.name AS name,
    state.alias AS alias,
    state.workflow_id AS workflow_id,
    workflow.name AS workflow_name
FROM
    object_state
JOIN
    state ON object_state.state_id == state.id
JOIN
    workflow ON state.workflow_id == workflow.id
WHERE
    object_state.kind = ?1 AND
    object_state.entity_id = ?2
        "#,
    )
    .bind(&entity.kind)
    .bind(entity.id)
    .fetch_optional(&*backend.pool)
    .await?;
    Ok(rec)
}

async fn list_object_states_for_kind_sqlite(
    backend: &SqliteBackend,
    kind: &str,
) -> Result<Vec<ObjectState>, BackendError> {
    let recs = sqlx::query(
        r#"
SELECT
    kind,
    entity_id,
    state_id
FROM
    object_state
WHERE
    kind = ?1
ORDER BY
    entity_id
        "#,
    )
    .bind(kind)
    .try_map(|row: sqlx::sqlite::SqliteRow| Ok(ObjectState {
        entity: EntityRef {
            kind: row.try_get("kind")?,
            id: row.try_get("entity_id")?,
        },
        state_id: row.try_get("state_id")?,
    }))
    .fetch_all(&*backend.pool)
    .await?;
    Ok(recs)
}

#[async_trait]
impl BindingBackend for SqliteBackend {
    async fn get_type_binding(
        &self,
        kind: &str,
    ) -> Result<Option<Workflow>, BackendError> {
        get_type_binding_sqlite(
            &self,
            kind,
        ).await
    }

    async fn set_type_binding(
        &self,
        kind: &str,
        workflow_id: i64,
    ) -> Result<(), BackendError> {
        set_type_binding_sqlite(
            &self,
            kind,
            workflow_id,
        ).await
    }

    async fn remove_type_binding(
        &self,
        kind: &str,
    ) -> Result<bool, BackendError> {
        remove_type_binding_sqlite(
            &self,
            kind,
        ).await
    }

    async fn list_type_bindings(
        &self,
        workflow_id: i64,
    ) -> Result<Vec<String>, BackendError> {
        list_type_bindings_sqlite(
            &self,
            workflow_id,
        ).await
    }

    async fn get_object_binding(
        &self,
        entity: &EntityRef,
    ) -> Result<Option<Workflow>, BackendError> {
        get_object_binding_sqlite(
            &self,
            entity,
        ).await
    }

    async fn set_object_binding(
        &self,
        entity: &EntityRef,
        workflow_id: i64,
    ) -> Result<(), BackendError> {
        set_object_binding_sqlite(
            &self,
            entity,
            workflow_id,
        ).await
    }

    async fn remove_object_binding(
        &self,
        entity: &EntityRef,
    ) -> Result<bool, BackendError> {
        remove_object_binding_sqlite(
            &self,
            entity,
        ).await
    }

    async fn list_object_bindings(
        &self,
        workflow_id: i64,
    ) -> Result<Vec<EntityRef>, BackendError> {
        list_object_bindings_sqlite(
            &self,
            workflow_id,
        ).await
    }

    async fn get_object_state(
        &self,
        entity: &EntityRef,
    ) -> Result<Option<State>, BackendError> {
        get_object_state_sqlite(
            &self,
            entity,
        ).await
    }

    async fn list_object_states_for_kind(
        &self,
        kind: &str,
    ) -> Result<Vec<ObjectState>, BackendError> {
        list_object_states_for_kind_sqlite(
            &self,
            kind,
        ).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use wfcore::{
        entity::EntityRef,
        workflow::traits::{
            BindingBackend,
            DefinitionBackend,
        },
    };
    use crate::SqliteBackend;

    #[async_std::test]
    async fn test_type_binding() -> anyhow::Result<()> {
        let backend = SqliteBackend::wf("sqlite::memory:".into()).await?;
        let first = backend.add_workflow("first").await?;
        let second = backend.add_workflow("second").await?;

        assert!(backend.get_type_binding("publication").await?.is_none());
        backend.set_type_binding("publication", first.id).await?;
        assert_eq!(Some(first.clone()), backend.get_type_binding("publication").await?);
        // upsert
        backend.set_type_binding("publication", second.id).await?;
        assert_eq!(Some(second.clone()), backend.get_type_binding("publication").await?);
        backend.set_type_binding("article", second.id).await?;
        assert_eq!(
            backend.list_type_bindings(second.id).await?,
            ["article", "publication"],
        );
        assert!(backend.list_type_bindings(first.id).await?.is_empty());

        assert!(backend.remove_type_binding("publication").await?);
        assert!(!backend.remove_type_binding("publication").await?);
        assert!(backend.get_type_binding("publication").await?.is_none());
        Ok(())
    }

    #[async_std::test]
    async fn test_object_binding() -> anyhow::Result<()> {
        let backend = SqliteBackend::wf("sqlite::memory:".into()).await?;
        let first = backend.add_workflow("first").await?;
        let second = backend.add_workflow("second").await?;
        let entity = EntityRef::new("publication", 1);
        let other = EntityRef::new("publication", 2);

        assert!(backend.get_object_binding(&entity).await?.is_none());
        backend.set_object_binding(&entity, first.id).await?;
        backend.set_object_binding(&entity, second.id).await?;
        backend.set_object_binding(&other, second.id).await?;
        assert_eq!(Some(second.clone()), backend.get_object_binding(&entity).await?);
        assert_eq!(
            backend.list_object_bindings(second.id).await?,
            [entity.clone(), other.clone()],
        );
        assert!(backend.remove_object_binding(&entity).await?);
        assert!(!backend.remove_object_binding(&entity).await?);
        assert_eq!(backend.list_object_bindings(second.id).await?, [other]);
        Ok(())
    }
}
