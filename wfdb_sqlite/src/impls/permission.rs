use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::{
    QueryBuilder,
    Row,
    Sqlite,
};
use wfcore::{
    ac::{
        agent::Agent,
        genpolicy::{
            AgentRole,
            Policy,
            ResGrant,
            RolePermit,
        },
        principal::Principal,
        role::{
            Permission,
            PermissionFilter,
            Role,
        },
        traits::PermissionBackend,
    },
    entity::EntityRef,
    error::BackendError,
};

use crate::{
    SqliteBackend,
    impls::inserted,
};

async fn register_role_sqlite(
    backend: &SqliteBackend,
    name: &str,
) -> Result<Role, BackendError> {
    sqlx::query(
        r#"
INSERT INTO role (
    name
)
VALUES ( ?1 )
ON CONFLICT(name) DO NOTHING
        "#,
    )
    .bind(name)
    .execute(&*backend.pool)
    .await?;
    get_role_by_name_sqlite(backend, name).await?
        .ok_or_else(|| BackendError::AppInvariantViolation(format!(
            "role {name:?} missing after registration"
        )))
}

async fn get_role_by_name_sqlite(
    backend: &SqliteBackend,
    name: &str,
) -> Result<Option<Role>, BackendError> {
    let rec = sqlx::query_as::<_, Role>(
        r#"
SELECT
    id,
    name
FROM
    role
WHERE
    name = ?1
        "#,
    )
    .bind(name)
    .fetch_optional(&*backend.pool)
    .await?;
    Ok(rec)
}

async fn register_permission_sqlite(
    backend: &SqliteBackend,
    name: &str,
    codename: &str,
) -> Result<Permission, BackendError> {
    sqlx::query(
        r#"
INSERT INTO permission (
    name,
    codename
)
VALUES ( ?1, ?2 )
ON CONFLICT(codename) DO NOTHING
        "#,
    )
    .bind(name)
    .bind(codename)
    .execute(&*backend.pool)
    .await?;
    get_permission_by_codename_sqlite(backend, codename).await?
        .ok_or_else(|| BackendError::AppInvariantViolation(format!(
            "permission {codename:?} missing after registration"
        )))
}

async fn get_permission_by_id_sqlite(
    backend: &SqliteBackend,
    id: i64,
) -> Result<Option<Permission>, BackendError> {
    let rec = sqlx::query_as::<_, Permission>(
        r#"
SELECT
    id,
    name,
    codename
FROM
    permission
WHERE
    id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&*backend.pool)
    .await?;
    Ok(rec)
}

async fn get_permission_by_codename_sqlite(
    backend: &SqliteBackend,
    codename: &str,
) -> Result<Option<Permission>, BackendError> {
    let rec = sqlx::query_as::<_, Permission>(
        r#"
SELECT
    id,
    name,
    codename
FROM
    permission
WHERE
    codename = ?1
        "#,
    )
    .bind(codename)
    .fetch_optional(&*backend.pool)
    .await?;
    Ok(rec)
}

async fn grant_object_permission_sqlite(
    backend: &SqliteBackend,
    entity: &EntityRef,
    role_id: i64,
    permission_id: i64,
) -> Result<bool, BackendError> {
    Ok(inserted(sqlx::query(
        r#"
INSERT INTO object_permission (
    kind,
    entity_id,
    role_id,
    permission_id
)
VALUES ( ?1, ?2, ?3, ?4 )
        "#,
    )
    .bind(&entity.kind)
    .bind(entity.id)
    .bind(role_id)
    .bind(permission_id)
    .execute(&*backend.pool)
    .await)?)
}

async fn revoke_object_permissions_sqlite(
    backend: &SqliteBackend,
    entity: &EntityRef,
    filter: &PermissionFilter,
) -> Result<u64, BackendError> {
    if filter.is_empty_match() {
        return Ok(0);
    }
    let mut builder = QueryBuilder::<Sqlite>::new(
        "DELETE FROM object_permission WHERE kind = "
    );
    builder.push_bind(entity.kind.clone())
        .push(" AND entity_id = ")
        .push_bind(entity.id);
    for (column, ids) in [
        ("role_id", &filter.roles),
        ("permission_id", &filter.permissions),
    ] {
        if let Some(ids) = ids {
            builder.push(format!(" AND {column} IN ("));
            let mut separated = builder.separated(", ");
            for id in ids.iter() {
                separated.push_bind(*id);
            }
            separated.push_unseparated(")");
        }
    }
    let result = builder.build()
        .execute(&*backend.pool)
        .await?
        .rows_affected();
    Ok(result)
}

async fn add_role_sqlite(
    backend: &SqliteBackend,
    principal: &Principal,
    role_id: i64,
) -> Result<bool, BackendError> {
    let principal_kind = <&'static str>::from(principal.kind());
    Ok(inserted(sqlx::query(
        r#"
INSERT INTO principal_role (
    principal_kind,
    principal_id,
    role_id
)
VALUES ( ?1, ?2, ?3 )
        "#,
    )
    .bind(principal_kind)
    .bind(principal.id())
    .bind(role_id)
    .execute(&*backend.pool)
    .await)?)
}

async fn add_local_role_sqlite(
    backend: &SqliteBackend,
    entity: &EntityRef,
    principal: &Principal,
    role_id: i64,
) -> Result<bool, BackendError> {
    let principal_kind = <&'static str>::from(principal.kind());
    Ok(inserted(sqlx::query(
        r#"
INSERT INTO local_role (
    kind,
    entity_id,
    principal_kind,
    principal_id,
    role_id
)
VALUES ( ?1, ?2, ?3, ?4, ?5 )
        "#,
    )
    .bind(&entity.kind)
    .bind(entity.id)
    .bind(principal_kind)
    .bind(principal.id())
    .bind(role_id)
    .execute(&*backend.pool)
    .await)?)
}

async fn remove_local_role_sqlite(
    backend: &SqliteBackend,
    entity: &EntityRef,
    principal: &Principal,
    role_id: i64,
) -> Result<bool, BackendError> {
    let principal_kind = <&'static str>::from(principal.kind());
    Ok(sqlx::query(
        r#"
DELETE FROM
    local_role
WHERE
    kind = ?1 AND
    entity_id = ?2 AND
    principal_kind = ?3 AND
    principal_id = ?4 AND
    role_id = ?5
        "#,
    )
    .bind(&entity.kind)
    .bind(entity.id)
    .bind(principal_kind)
    .bind(principal.id())
    .bind(role_id)
    .execute(&*backend.pool)
    .await?
    .rows_affected() > 0)
}

async fn reset_sqlite(
    backend: &SqliteBackend,
    entity: &EntityRef,
) -> Result<(), BackendError> {
    let mut tx = backend.pool.begin().await?;
    sqlx::query(
        r#"
DELETE FROM
    object_permission
WHERE
    kind = ?1 AND
    entity_id = ?2
        "#,
    )
    .bind(&entity.kind)
    .bind(entity.id)
    .execute(&mut *tx)
    .await?;
    sqlx::query(
        r#"
DELETE FROM
    local_role
WHERE
    kind = ?1 AND
    entity_id = ?2
        "#,
    )
    .bind(&entity.kind)
    .bind(entity.id)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(())
}

async fn generate_policy_for_agent_entity_sqlite(
    backend: &SqliteBackend,
    agent: &Agent,
    entity: &EntityRef,
) -> Result<Policy, BackendError> {
    let resource = entity.to_string();
    let user_id = agent.user_id();
    let agent_name: Option<String> = agent.clone().into();

    let mut agent_roles = Vec::new();
    let mut res_grants = Vec::new();
    // an anonymous agent holds no roles
    if let Some(user_id) = user_id {
        let mut rows = sqlx::query(
            r#"
SELECT
    role.name AS role
FROM
    principal_role
JOIN
    role ON principal_role.role_id == role.id
WHERE
    (principal_kind = 'user' AND principal_id = ?1) OR
    (principal_kind = 'group' AND principal_id IN (
        SELECT group_id FROM group_member WHERE user_id = ?1
    ))
            "#,
        )
        .bind(user_id)
        .fetch(&*backend.pool);
        while let Some(row) = rows.try_next().await? {
            agent_roles.push(AgentRole {
                agent: agent_name.clone(),
                role: row.try_get("role")?,
            });
        }
        drop(rows);

        let mut rows = sqlx::query(
            r#"
SELECT
    role.name AS role
FROM
    local_role
JOIN
    role ON local_role.role_id == role.id
WHERE
    kind = ?2 AND
    entity_id = ?3 AND (
        (principal_kind = 'user' AND principal_id = ?1) OR
        (principal_kind = 'group' AND principal_id IN (
            SELECT group_id FROM group_member WHERE user_id = ?1
        ))
    )
            "#,
        )
        .bind(user_id)
        .bind(&entity.kind)
        .bind(entity.id)
        .fetch(&*backend.pool);
        while let Some(row) = rows.try_next().await? {
            res_grants.push(ResGrant {
                res: resource.clone(),
                agent: agent_name.clone(),
                role: row.try_get("role")?,
            });
        }
    }

    let role_permits = sqlx::query(
        r#"
SELECT
    role.name AS role,
    permission.codename AS action
FROM
    object_permission
JOIN
    role ON object_permission.role_id == role.id
JOIN
    permission ON object_permission.permission_id == permission.id
WHERE
    kind = ?1 AND
    entity_id = ?2
        "#,
    )
    .bind(&entity.kind)
    .bind(entity.id)
    .try_map(|row: sqlx::sqlite::SqliteRow| Ok(RolePermit {
        role: row.try_get("role")?,
        action: row.try_get("action")?,
    }))
    .fetch_all(&*backend.pool)
    .await?;

    Ok(Policy {
        agent: agent.clone(),
        resource,
        agent_roles,
        res_grants,
        role_permits,
    })
}

#[async_trait]
impl PermissionBackend for SqliteBackend {
    async fn register_role(
        &self,
        name: &str,
    ) -> Result<Role, BackendError> {
        register_role_sqlite(
            &self,
            name,
        ).await
    }

    async fn get_role_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Role>, BackendError> {
        get_role_by_name_sqlite(
            &self,
            name,
        ).await
    }

    async fn register_permission(
        &self,
        name: &str,
        codename: &str,
    ) -> Result<Permission, BackendError> {
        register_permission_sqlite(
            &self,
            name,
            codename,
        ).await
    }

    async fn get_permission_by_id(
        &self,
        id: i64,
    ) -> Result<Option<Permission>, BackendError> {
        get_permission_by_id_sqlite(
            &self,
            id,
        ).await
    }

    async fn get_permission_by_codename(
        &self,
        codename: &str,
    ) -> Result<Option<Permission>, BackendError> {
        get_permission_by_codename_sqlite(
            &self,
            codename,
        ).await
    }

    async fn grant_object_permission(
        &self,
        entity: &EntityRef,
        role_id: i64,
        permission_id: i64,
    ) -> Result<bool, BackendError> {
        grant_object_permission_sqlite(
            &self,
            entity,
            role_id,
            permission_id,
        ).await
    }

    async fn revoke_object_permissions(
        &self,
        entity: &EntityRef,
        filter: &PermissionFilter,
    ) -> Result<u64, BackendError> {
        revoke_object_permissions_sqlite(
            &self,
            entity,
            filter,
        ).await
    }

    async fn add_role(
        &self,
        principal: &Principal,
        role_id: i64,
    ) -> Result<bool, BackendError> {
        add_role_sqlite(
            &self,
            principal,
            role_id,
        ).await
    }

    async fn add_local_role(
        &self,
        entity: &EntityRef,
        principal: &Principal,
        role_id: i64,
    ) -> Result<bool, BackendError> {
        add_local_role_sqlite(
            &self,
            entity,
            principal,
            role_id,
        ).await
    }

    async fn remove_local_role(
        &self,
        entity: &EntityRef,
        principal: &Principal,
        role_id: i64,
    ) -> Result<bool, BackendError> {
        remove_local_role_sqlite(
            &self,
            entity,
            principal,
            role_id,
        ).await
    }

    async fn reset(
        &self,
        entity: &EntityRef,
    ) -> Result<(), BackendError> {
        reset_sqlite(
            &self,
            entity,
        ).await
    }

    async fn generate_policy_for_agent_entity(
        &self,
        agent: &Agent,
        entity: &EntityRef,
    ) -> Result<Policy, BackendError> {
        generate_policy_for_agent_entity_sqlite(
            &self,
            agent,
            entity,
        ).await
    }
}
