use async_trait::async_trait;
use wfcore::{
    ac::{
        traits::PrincipalBackend,
        user::{
            Group,
            User,
        },
    },
    error::BackendError,
};

use crate::{
    SqliteBackend,
    chrono::Utc,
    impls::inserted,
};

async fn add_user_sqlite(
    backend: &SqliteBackend,
    name: &str,
) -> Result<i64, BackendError> {
    let ts = Utc::now().timestamp();
    let id = sqlx::query(
        r#"
INSERT INTO 'user' (
    name,
    created_ts
)
VALUES ( ?1, ?2 )
        "#,
    )
    .bind(name)
    .bind(ts)
    .execute(&*backend.pool)
    .await?
    .last_insert_rowid();
    Ok(id)
}

async fn get_user_by_id_sqlite(
    backend: &SqliteBackend,
    id: i64,
) -> Result<Option<User>, BackendError> {
    let rec = sqlx::query_as::<_, User>(
        r#"
SELECT
    id,
    name,
    created_ts
FROM
    'user'
WHERE
    id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&*backend.pool)
    .await?;
    Ok(rec)
}

async fn get_user_by_name_sqlite(
    backend: &SqliteBackend,
    name: &str,
) -> Result<Option<User>, BackendError> {
    let rec = sqlx::query_as::<_, User>(
        r#"
SELECT
    id,
    name,
    created_ts
FROM
    'user'
WHERE
    name = ?1
        "#,
    )
    .bind(name)
    .fetch_optional(&*backend.pool)
    .await?;
    Ok(rec)
}

async fn add_group_sqlite(
    backend: &SqliteBackend,
    name: &str,
) -> Result<i64, BackendError> {
    let ts = Utc::now().timestamp();
    let id = sqlx::query(
        r#"
INSERT INTO user_group (
    name,
    created_ts
)
VALUES ( ?1, ?2 )
        "#,
    )
    .bind(name)
    .bind(ts)
    .execute(&*backend.pool)
    .await?
    .last_insert_rowid();
    Ok(id)
}

async fn get_group_by_id_sqlite(
    backend: &SqliteBackend,
    id: i64,
) -> Result<Option<Group>, BackendError> {
    let rec = sqlx::query_as::<_, Group>(
        r#"
SELECT
    id,
    name,
    created_ts
FROM
    user_group
WHERE
    id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&*backend.pool)
    .await?;
    Ok(rec)
}

async fn get_group_by_name_sqlite(
    backend: &SqliteBackend,
    name: &str,
) -> Result<Option<Group>, BackendError> {
    let rec = sqlx::query_as::<_, Group>(
        r#"
SELECT
    id,
    name,
    created_ts
FROM
    user_group
WHERE
    name = ?1
        "#,
    )
    .bind(name)
    .fetch_optional(&*backend.pool)
    .await?;
    Ok(rec)
}

async fn add_user_to_group_sqlite(
    backend: &SqliteBackend,
    user_id: i64,
    group_id: i64,
) -> Result<bool, BackendError> {
    Ok(inserted(sqlx::query(
        r#"
INSERT INTO group_member (
    group_id,
    user_id
)
VALUES ( ?1, ?2 )
        "#,
    )
    .bind(group_id)
    .bind(user_id)
    .execute(&*backend.pool)
    .await)?)
}

async fn list_groups_for_user_sqlite(
    backend: &SqliteBackend,
    user_id: i64,
) -> Result<Vec<Group>, BackendError> {
    let recs = sqlx::query_as::<_, Group>(
        r#"
SELECT
    user_group.id AS id,
    user_group.name AS name,
    user_group.created_ts AS created_ts
FROM
    group_member
JOIN
    user_group ON group_member.group_id == user_group.id
WHERE
    group_member.user_id = ?1
ORDER BY
    user_group.id
        "#,
    )
    .bind(user_id)
    .fetch_all(&*backend.pool)
    .await?;
    Ok(recs)
}

#[async_trait]
impl PrincipalBackend for SqliteBackend {
    async fn add_user(
        &self,
        name: &str,
    ) -> Result<i64, BackendError> {
        add_user_sqlite(
            &self,
            name,
        ).await
    }

    async fn get_user_by_id(
        &self,
        id: i64,
    ) -> Result<Option<User>, BackendError> {
        get_user_by_id_sqlite(
            &self,
            id,
        ).await
    }

    async fn get_user_by_name(
        &self,
        name: &str,
    ) -> Result<Option<User>, BackendError> {
        get_user_by_name_sqlite(
            &self,
            name,
        ).await
    }

    async fn add_group(
        &self,
        name: &str,
    ) -> Result<i64, BackendError> {
        add_group_sqlite(
            &self,
            name,
        ).await
    }

    async fn get_group_by_id(
        &self,
        id: i64,
    ) -> Result<Option<Group>, BackendError> {
        get_group_by_id_sqlite(
            &self,
            id,
        ).await
    }

    async fn get_group_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Group>, BackendError> {
        get_group_by_name_sqlite(
            &self,
            name,
        ).await
    }

    async fn add_user_to_group(
        &self,
        user_id: i64,
        group_id: i64,
    ) -> Result<bool, BackendError> {
        add_user_to_group_sqlite(
            &self,
            user_id,
            group_id,
        ).await
    }

    async fn list_groups_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<Group>, BackendError> {
        list_groups_for_user_sqlite(
            &self,
            user_id,
        ).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use wfcore::ac::traits::PrincipalBackend;
    use crate::SqliteBackend;

    #[async_std::test]
    async fn test_users() -> anyhow::Result<()> {
        let backend = SqliteBackend::wf("sqlite::memory:".into()).await?;
        let user_id = PrincipalBackend::add_user(&backend, "alice").await?;
        let user = PrincipalBackend::get_user_by_id(&backend, user_id).await?
            .expect("user is missing?");
        assert_eq!(user.name, "alice");
        assert_eq!(
            Some(user.clone()),
            PrincipalBackend::get_user_by_name(&backend, "alice").await?,
        );
        assert!(PrincipalBackend::get_user_by_name(&backend, "bob").await?.is_none());
        // names are unique
        assert!(PrincipalBackend::add_user(&backend, "alice").await.is_err());
        Ok(())
    }

    #[async_std::test]
    async fn test_groups() -> anyhow::Result<()> {
        let backend = SqliteBackend::wf("sqlite::memory:".into()).await?;
        let user_id = PrincipalBackend::add_user(&backend, "alice").await?;
        let editors = PrincipalBackend::add_group(&backend, "editors").await?;
        let readers = PrincipalBackend::add_group(&backend, "readers").await?;
        assert!(PrincipalBackend::add_user_to_group(&backend, user_id, editors).await?);
        assert!(!PrincipalBackend::add_user_to_group(&backend, user_id, editors).await?);
        assert!(PrincipalBackend::add_user_to_group(&backend, user_id, readers).await?);
        let groups = PrincipalBackend::list_groups_for_user(&backend, user_id).await?;
        assert_eq!(
            groups.iter().map(|g| g.name.as_str()).collect::<Vec<_>>(),
            ["editors", "readers"],
        );
        assert_eq!(
            PrincipalBackend::get_group_by_name(&backend, "readers").await?
                .map(|g| g.id),
            Some(readers),
        );
        assert!(PrincipalBackend::get_group_by_id(&backend, 99).await?.is_none());
        assert!(PrincipalBackend::get_user_by_id(&backend, 99).await?.is_none());
        Ok(())
    }
}
