use async_trait::async_trait;
use wfcore::{
    ac::role::Permission,
    error::BackendError,
    workflow::{
        State,
        StatePermissionGrant,
        States,
        Transition,
        Transitions,
        Workflow,
        traits::DefinitionBackend,
    },
};

use crate::{
    SqliteBackend,
    impls::inserted,
};

async fn add_workflow_sqlite(
    backend: &SqliteBackend,
    name: &str,
) -> Result<Workflow, BackendError> {
    sqlx::query(
        r#"
INSERT INTO workflow (
    name
)
VALUES ( ?1 )
ON CONFLICT(name) DO NOTHING
        "#,
    )
    .bind(name)
    .execute(&*backend.pool)
    .await?;
    get_workflow_by_name_sqlite(backend, name).await?
        .ok_or_else(|| BackendError::AppInvariantViolation(format!(
            "workflow {name:?} missing after creation"
        )))
}

async fn get_workflow_by_id_sqlite(
    backend: &SqliteBackend,
    id: i64,
) -> Result<Option<Workflow>, BackendError> {
    let rec = sqlx::query_as::<_, Workflow>(
        r#"
SELECT
    id,
    name,
    initial_state_id
FROM
    workflow
WHERE
    id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&*backend.pool)
    .await?;
    Ok(rec)
}

async fn get_workflow_by_name_sqlite(
    backend: &SqliteBackend,
    name: &str,
) -> Result<Option<Workflow>, BackendError> {
    let rec = sqlx::query_as::<_, Workflow>(
        r#"
SELECT
    id,
    name,
    initial_state_id
FROM
    workflow
WHERE
    name = ?1
        "#,
    )
    .bind(name)
    .fetch_optional(&*backend.pool)
    .await?;
    Ok(rec)
}

async fn list_workflows_sqlite(
    backend: &SqliteBackend,
) -> Result<Vec<Workflow>, BackendError> {
    let recs = sqlx::query_as::<_, Workflow>(
        r#"
SELECT
    id,
    name,
    initial_state_id
FROM
    workflow
ORDER BY
    id
        "#,
    )
    .fetch_all(&*backend.pool)
    .await?;
    Ok(recs)
}

async fn set_workflow_initial_state_sqlite(
    backend: &SqliteBackend,
    workflow_id: i64,
    state_id: i64,
) -> Result<bool, BackendError> {
    let rows_affected = sqlx::query(
        r#"
UPDATE
    workflow
SET
    initial_state_id = ?2
WHERE
    id = ?1
        "#,
    )
    .bind(workflow_id)
    .bind(state_id)
    .execute(&*backend.pool)
    .await?
    .rows_affected();
    Ok(rows_affected > 0)
}

async fn add_state_sqlite(
    backend: &SqliteBackend,
    workflow_id: i64,
    name: &str,
    alias: Option<&str>,
) -> Result<State, BackendError> {
    sqlx::query(
        r#"
INSERT INTO state (
    name,
    alias,
    workflow_id
)
VALUES ( ?1, ?2, ?3 )
ON CONFLICT(name, workflow_id) DO NOTHING
        "#,
    )
    .bind(name)
    .bind(alias)
    .bind(workflow_id)
    .execute(&*backend.pool)
    .await?;
    get_state_by_name_sqlite(backend, workflow_id, name).await?
        .ok_or_else(|| BackendError::AppInvariantViolation(format!(
            "state {name:?} missing after creation"
        )))
}

async fn get_state_by_id_sqlite(
    backend: &SqliteBackend,
    id: i64,
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
    state
JOIN
    workflow ON state.workflow_id == workflow.id
WHERE
    state.id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&*backend.pool)
    .await?;
    Ok(rec)
}

async fn get_state_by_name_sqlite(
    backend: &SqliteBackend,
    workflow_id: i64,
    name: &str,
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
    state
JOIN
    workflow ON state.workflow_id == workflow.id
WHERE
    state.workflow_id = ?1 AND
    state.name = ?2
        "#,
    )
    .bind(workflow_id)
    .bind(name)
    .fetch_optional(&*backend.pool)
    .await?;
    Ok(rec)
}

async fn list_states_sqlite(
    backend: &SqliteBackend,
    workflow_id: i64,
) -> Result<States, BackendError> {
    let recs = sqlx::query_as::<_, State>(
        r#"
SELECT
    state.id AS id,
    state.name AS name,
    state.alias AS alias,
    state.workflow_id AS workflow_id,
    workflow.name AS workflow_name
FROM
    state
JOIN
    workflow ON state.workflow_id == workflow.id
WHERE
    state.workflow_id = ?1
ORDER BY
    state.id
        "#,
    )
    .bind(workflow_id)
    .fetch_all(&*backend.pool)
    .await?;
    Ok(recs.into())
}

async fn add_transition_sqlite(
    backend: &SqliteBackend,
    workflow_id: i64,
    name: &str,
    destination_id: Option<i64>,
    permission_id: Option<i64>,
    condition: Option<&str>,
    description: Option<&str>,
) -> Result<Transition, BackendError> {
    sqlx::query(
        r#"
INSERT INTO transition (
    name,
    workflow_id,
    destination_id,
    condition,
    permission_id,
    description
)
VALUES ( ?1, ?2, ?3, ?4, ?5, ?6 )
ON CONFLICT(name, workflow_id) DO NOTHING
        "#,
    )
    .bind(name)
    .bind(workflow_id)
    .bind(destination_id)
    .bind(condition)
    .bind(permission_id)
    .bind(description)
    .execute(&*backend.pool)
    .await?;
    get_transition_by_name_sqlite(backend, workflow_id, name).await?
        .ok_or_else(|| BackendError::AppInvariantViolation(format!(
            "transition {name:?} missing after creation"
        )))
}

async fn get_transition_by_id_sqlite(
    backend: &SqliteBackend,
    id: i64,
) -> Result<Option<Transition>, BackendError> {
    let rec = sqlx::query_as::<_, Transition>(
        r#"
SELECT
    id,
    name,
    workflow_id,
    destination_id,
    condition,
    permission_id,
    description
FROM
    transition
WHERE
    id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&*backend.pool)
    .await?;
    Ok(rec)
}

async fn get_transition_by_name_sqlite(
    backend: &SqliteBackend,
    workflow_id: i64,
    name: &str,
) -> Result<Option<Transition>, BackendError> {
    let rec = sqlx::query_as::<_, Transition>(
        r#"
SELECT
    id,
    name,
    workflow_id,
    destination_id,
    condition,
    permission_id,
    description
FROM
    transition
WHERE
    workflow_id = ?1 AND
    name = ?2
        "#,
    )
    .bind(workflow_id)
    .bind(name)
    .fetch_optional(&*backend.pool)
    .await?;
    Ok(rec)
}

async fn list_transitions_sqlite(
    backend: &SqliteBackend,
    workflow_id: i64,
) -> Result<Transitions, BackendError> {
    let recs = sqlx::query_as::<_, Transition>(
        r#"
SELECT
    id,
    name,
    workflow_id,
    destination_id,
    condition,
    permission_id,
    description
FROM
    transition
WHERE
    workflow_id = ?1
ORDER BY
    id
        "#,
    )
    .bind(workflow_id)
    .fetch_all(&*backend.pool)
    .await?;
    Ok(recs.into())
}

async fn link_state_transition_sqlite(
    backend: &SqliteBackend,
    state_id: i64,
    transition_id: i64,
) -> Result<bool, BackendError> {
    Ok(inserted(sqlx::query(
        r#"
INSERT INTO state_transition (
    state_id,
    transition_id
)
VALUES ( ?1, ?2 )
        "#,
    )
    .bind(state_id)
    .bind(transition_id)
    .execute(&*backend.pool)
    .await)?)
}

async fn list_state_transitions_sqlite(
    backend: &SqliteBackend,
    state_id: i64,
) -> Result<Transitions, BackendError> {
    let recs = sqlx::query_as::<_, Transition>(
        r#"
SELECT
    transition.id AS id,
    transition.name AS name,
    transition.workflow_id AS workflow_id,
    transition.destination_id AS destination_id,
    transition.condition AS condition,
    transition.permission_id AS permission_id,
    transition.description AS description
FROM
    state_transition
JOIN
    transition ON state_transition.transition_id == transition.id
WHERE
    state_transition.state_id = ?1
ORDER BY
    state_transition.id
        "#,
    )
    .bind(state_id)
    .fetch_all(&*backend.pool)
    .await?;
    Ok(recs.into())
}

async fn add_state_permission_grant_sqlite(
    backend: &SqliteBackend,
    state_id: i64,
    role_id: i64,
    permission_id: i64,
) -> Result<bool, BackendError> {
    Ok(inserted(sqlx::query(
        r#"
INSERT INTO state_permission_grant (
    state_id,
    role_id,
    permission_id
)
VALUES ( ?1, ?2, ?3 )
        "#,
    )
    .bind(state_id)
    .bind(role_id)
    .bind(permission_id)
    .execute(&*backend.pool)
    .await)?)
}

async fn list_state_permission_grants_sqlite(
    backend: &SqliteBackend,
    state_id: i64,
) -> Result<Vec<StatePermissionGrant>, BackendError> {
    let recs = sqlx::query_as::<_, StatePermissionGrant>(
        r#"
SELECT
    state_id,
    role_id,
    permission_id
FROM
    state_permission_grant
WHERE
    state_id = ?1
ORDER BY
    id
        "#,
    )
    .bind(state_id)
    .fetch_all(&*backend.pool)
    .await?;
    Ok(recs)
}

async fn add_workflow_permission_sqlite(
    backend: &SqliteBackend,
    workflow_id: i64,
    permission_id: i64,
) -> Result<bool, BackendError> {
    Ok(inserted(sqlx::query(
        r#"
INSERT INTO workflow_permission (
    workflow_id,
    permission_id
)
VALUES ( ?1, ?2 )
        "#,
    )
    .bind(workflow_id)
    .bind(permission_id)
    .execute(&*backend.pool)
    .await)?)
}

async fn list_workflow_permissions_sqlite(
    backend: &SqliteBackend,
    workflow_id: i64,
) -> Result<Vec<Permission>, BackendError> {
    let recs = sqlx::query_as::<_, Permission>(
        r#"
SELECT
    permission.id AS id,
    permission.name AS name,
    permission.codename AS codename
FROM
    workflow_permission
JOIN
    permission ON workflow_permission.permission_id == permission.id
WHERE
    workflow_permission.workflow_id = ?1
ORDER BY
    workflow_permission.id
        "#,
    )
    .bind(workflow_id)
    .fetch_all(&*backend.pool)
    .await?;
    Ok(recs)
}

#[async_trait]
impl DefinitionBackend for SqliteBackend {
    async fn add_workflow(
        &self,
        name: &str,
    ) -> Result<Workflow, BackendError> {
        add_workflow_sqlite(
            &self,
            name,
        ).await
    }

    async fn get_workflow_by_id(
        &self,
        id: i64,
    ) -> Result<Option<Workflow>, BackendError> {
        get_workflow_by_id_sqlite(
            &self,
            id,
        ).await
    }

    async fn get_workflow_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Workflow>, BackendError> {
        get_workflow_by_name_sqlite(
            &self,
            name,
        ).await
    }

    async fn list_workflows(
        &self,
    ) -> Result<Vec<Workflow>, BackendError> {
        list_workflows_sqlite(
            &self,
        ).await
    }

    async fn set_workflow_initial_state(
        &self,
        workflow_id: i64,
        state_id: i64,
    ) -> Result<bool, BackendError> {
        set_workflow_initial_state_sqlite(
            &self,
            workflow_id,
            state_id,
        ).await
    }

    async fn add_state(
        &self,
        workflow_id: i64,
        name: &str,
        alias: Option<&str>,
    ) -> Result<State, BackendError> {
        add_state_sqlite(
            &self,
            workflow_id,
            name,
            alias,
        ).await
    }

    async fn get_state_by_id(
        &self,
        id: i64,
    ) -> Result<Option<State>, BackendError> {
        get_state_by_id_sqlite(
            &self,
            id,
        ).await
    }

    async fn get_state_by_name(
        &self,
        workflow_id: i64,
        name: &str,
    ) -> Result<Option<State>, BackendError> {
        get_state_by_name_sqlite(
            &self,
            workflow_id,
            name,
        ).await
    }

    async fn list_states(
        &self,
        workflow_id: i64,
    ) -> Result<States, BackendError> {
        list_states_sqlite(
            &self,
            workflow_id,
        ).await
    }

    async fn add_transition(
        &self,
        workflow_id: i64,
        name: &str,
        destination_id: Option<i64>,
        permission_id: Option<i64>,
        condition: Option<&str>,
        description: Option<&str>,
    ) -> Result<Transition, BackendError> {
        add_transition_sqlite(
            &self,
            workflow_id,
            name,
            destination_id,
            permission_id,
            condition,
            description,
        ).await
    }

    async fn get_transition_by_id(
        &self,
        id: i64,
    ) -> Result<Option<Transition>, BackendError> {
        get_transition_by_id_sqlite(
            &self,
            id,
        ).await
    }

    async fn get_transition_by_name(
        &self,
        workflow_id: i64,
        name: &str,
    ) -> Result<Option<Transition>, BackendError> {
        get_transition_by_name_sqlite(
            &self,
            workflow_id,
            name,
        ).await
    }

    async fn list_transitions(
        &self,
        workflow_id: i64,
    ) -> Result<Transitions, BackendError> {
        list_transitions_sqlite(
            &self,
            workflow_id,
        ).await
    }

    async fn link_state_transition(
        &self,
        state_id: i64,
        transition_id: i64,
    ) -> Result<bool, BackendError> {
        link_state_transition_sqlite(
            &self,
            state_id,
            transition_id,
        ).await
    }

    async fn list_state_transitions(
        &self,
        state_id: i64,
    ) -> Result<Transitions, BackendError> {
        list_state_transitions_sqlite(
            &self,
            state_id,
        ).await
    }

    async fn add_state_permission_grant(
        &self,
        state_id: i64,
        role_id: i64,
        permission_id: i64,
    ) -> Result<bool, BackendError> {
        add_state_permission_grant_sqlite(
            &self,
            state_id,
            role_id,
            permission_id,
        ).await
    }

    async fn list_state_permission_grants(
        &self,
        state_id: i64,
    ) -> Result<Vec<StatePermissionGrant>, BackendError> {
        list_state_permission_grants_sqlite(
            &self,
            state_id,
        ).await
    }

    async fn add_workflow_permission(
        &self,
        workflow_id: i64,
        permission_id: i64,
    ) -> Result<bool, BackendError> {
        add_workflow_permission_sqlite(
            &self,
            workflow_id,
            permission_id,
        ).await
    }

    async fn list_workflow_permissions(
        &self,
        workflow_id: i64,
    ) -> Result<Vec<Permission>, BackendError> {
        list_workflow_permissions_sqlite(
            &self,
            workflow_id,
        ).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use wfcore::{
        ac::traits::PermissionBackend,
        workflow::traits::DefinitionBackend,
    };
    use crate::SqliteBackend;

    #[async_std::test]
    async fn test_workflow_states() -> anyhow::Result<()> {
        let backend = SqliteBackend::wf("sqlite::memory:".into()).await?;
        let workflow = backend.add_workflow("publication").await?;
        assert_eq!(workflow.initial_state_id, None);
        assert_eq!(workflow, backend.add_workflow("publication").await?);

        let private = backend.add_state(workflow.id, "private", Some("Private")).await?;
        assert_eq!(private.workflow_name, "publication");
        assert_eq!(private.alias.as_deref(), Some("Private"));
        // get-or-create returns the existing row as is
        assert_eq!(private, backend.add_state(workflow.id, "private", None).await?);
        let public = backend.add_state(workflow.id, "public", None).await?;

        let other = backend.add_workflow("other").await?;
        let other_private = backend.add_state(other.id, "private", None).await?;
        assert_ne!(private.id, other_private.id);

        assert!(backend.set_workflow_initial_state(workflow.id, private.id).await?);
        assert!(!backend.set_workflow_initial_state(999, private.id).await?);
        assert_eq!(
            backend.get_workflow_by_id(workflow.id).await?
                .and_then(|w| w.initial_state_id),
            Some(private.id),
        );

        let states = backend.list_states(workflow.id).await?;
        assert_eq!(
            states.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
            ["private", "public"],
        );
        assert_eq!(Some(public.clone()), backend.get_state_by_id(public.id).await?);
        assert!(backend.get_state_by_name(other.id, "public").await?.is_none());
        assert_eq!(
            backend.list_workflows().await?
                .iter()
                .map(|w| w.name.as_str())
                .collect::<Vec<_>>(),
            ["publication", "other"],
        );
        Ok(())
    }

    #[async_std::test]
    async fn test_transitions() -> anyhow::Result<()> {
        let backend = SqliteBackend::wf("sqlite::memory:".into()).await?;
        let edit = backend.register_permission("Edit", "edit").await?;
        let workflow = backend.add_workflow("publication").await?;
        let private = backend.add_state(workflow.id, "private", None).await?;
        let public = backend.add_state(workflow.id, "public", None).await?;

        let publish = backend.add_transition(
            workflow.id,
            "publish",
            Some(public.id),
            Some(edit.id),
            Some("can_publish"),
            Some("Make it public"),
        ).await?;
        assert_eq!(publish.destination_id, Some(public.id));
        assert_eq!(publish.condition.as_deref(), Some("can_publish"));
        let touch = backend.add_transition(
            workflow.id, "touch", None, None, None, None,
        ).await?;
        assert_eq!(touch.destination_id, None);
        assert_eq!(
            publish,
            backend.add_transition(workflow.id, "publish", None, None, None, None).await?,
        );

        // link order, not insertion order of the transitions
        assert!(backend.link_state_transition(private.id, touch.id).await?);
        assert!(backend.link_state_transition(private.id, publish.id).await?);
        assert!(!backend.link_state_transition(private.id, touch.id).await?);
        assert_eq!(
            backend.list_state_transitions(private.id).await?.names(),
            ["touch", "publish"],
        );
        assert!(backend.list_state_transitions(public.id).await?.is_empty());
        assert_eq!(
            backend.list_transitions(workflow.id).await?.names(),
            ["publish", "touch"],
        );
        assert_eq!(
            Some(touch.clone()),
            backend.get_transition_by_id(touch.id).await?,
        );
        assert!(backend.get_transition_by_name(workflow.id, "retract").await?.is_none());
        Ok(())
    }

    #[async_std::test]
    async fn test_permission_grants() -> anyhow::Result<()> {
        let backend = SqliteBackend::wf("sqlite::memory:".into()).await?;
        let owner = backend.register_role("Owner").await?;
        let view = backend.register_permission("View", "view").await?;
        let edit = backend.register_permission("Edit", "edit").await?;
        let workflow = backend.add_workflow("publication").await?;
        let private = backend.add_state(workflow.id, "private", None).await?;

        assert!(backend.add_state_permission_grant(private.id, owner.id, view.id).await?);
        assert!(backend.add_state_permission_grant(private.id, owner.id, edit.id).await?);
        assert!(!backend.add_state_permission_grant(private.id, owner.id, edit.id).await?);
        let grants = backend.list_state_permission_grants(private.id).await?;
        assert_eq!(grants.len(), 2);
        assert_eq!(grants[1].permission_id, edit.id);

        assert!(backend.add_workflow_permission(workflow.id, view.id).await?);
        assert!(backend.add_workflow_permission(workflow.id, edit.id).await?);
        assert!(!backend.add_workflow_permission(workflow.id, view.id).await?);
        assert_eq!(
            backend.list_workflow_permissions(workflow.id).await?,
            [view, edit],
        );
        Ok(())
    }
}
