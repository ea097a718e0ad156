use wfcore::{
    ac::{
        agent::Agent,
        principal::Principal,
        role::{
            Permission,
            PermissionFilter,
            Role,
        },
        user::{
            Group,
            User,
        },
    },
    entity::EntityRef,
    error::BackendError,
};

use crate::{
    error::Error,
    platform::Platform,
};

fn missing(what: &str, id: i64) -> Error {
    BackendError::AppInvariantViolation(format!("{what} {id} vanished after insert")).into()
}

// Permission bridge
impl Platform {
    pub async fn register_role(&self, name: &str) -> Result<Role, Error> {
        Ok(self.wf_platform.register_role(name).await?)
    }

    pub async fn role_by_name(&self, name: &str) -> Result<Option<Role>, Error> {
        Ok(self.wf_platform.get_role_by_name(name).await?)
    }

    pub async fn register_permission(
        &self,
        name: &str,
        codename: &str,
    ) -> Result<Permission, Error> {
        Ok(self.wf_platform.register_permission(name, codename).await?)
    }

    pub async fn permission_by_codename(
        &self,
        codename: &str,
    ) -> Result<Option<Permission>, Error> {
        Ok(self.wf_platform.get_permission_by_codename(codename).await?)
    }

    pub async fn grant_object_permission(
        &self,
        entity: &EntityRef,
        role: &Role,
        permission: &Permission,
    ) -> Result<bool, Error> {
        Ok(self.wf_platform.grant_object_permission(
            entity,
            role.id,
            permission.id,
        ).await?)
    }

    pub async fn revoke_object_permissions(
        &self,
        entity: &EntityRef,
        filter: &PermissionFilter,
    ) -> Result<u64, Error> {
        Ok(self.wf_platform.revoke_object_permissions(entity, filter).await?)
    }

    /// Whether the actor holds the permission on the entity, through
    /// any global or local role of the user or of the groups the user
    /// belongs to.
    pub async fn has_permission(
        &self,
        entity: &EntityRef,
        actor: &Agent,
        codename: &str,
    ) -> Result<bool, Error> {
        let policy = self.wf_platform
            .generate_policy_for_agent_entity(actor, entity)
            .await?;
        let result = self.rbac_builder
            .build_with_policy(policy)
            .await?
            .enforce(actor, &entity.to_string(), codename)?;
        log::trace!("has_permission({entity}, {actor}, {codename}) = {result}");
        Ok(result)
    }

    pub async fn add_role(
        &self,
        principal: &Principal,
        role: &Role,
    ) -> Result<bool, Error> {
        Ok(self.wf_platform.add_role(principal, role.id).await?)
    }

    pub async fn add_local_role(
        &self,
        entity: &EntityRef,
        principal: &Principal,
        role: &Role,
    ) -> Result<bool, Error> {
        Ok(self.wf_platform.add_local_role(entity, principal, role.id).await?)
    }

    pub async fn remove_local_role(
        &self,
        entity: &EntityRef,
        principal: &Principal,
        role: &Role,
    ) -> Result<bool, Error> {
        Ok(self.wf_platform.remove_local_role(entity, principal, role.id).await?)
    }

    /// Clears all permission state held for the entity.
    pub async fn reset(&self, entity: &EntityRef) -> Result<(), Error> {
        Ok(self.wf_platform.reset(entity).await?)
    }
}

// Principals
impl Platform {
    pub async fn create_user(&self, name: &str) -> Result<User, Error> {
        let id = self.wf_platform.add_user(name).await?;
        self.wf_platform.get_user_by_id(id).await?
            .ok_or_else(|| missing("user", id))
    }

    pub async fn user_by_name(&self, name: &str) -> Result<Option<User>, Error> {
        Ok(self.wf_platform.get_user_by_name(name).await?)
    }

    pub async fn user_by_id(&self, id: i64) -> Result<Option<User>, Error> {
        Ok(self.wf_platform.get_user_by_id(id).await?)
    }

    pub async fn create_group(&self, name: &str) -> Result<Group, Error> {
        let id = self.wf_platform.add_group(name).await?;
        self.wf_platform.get_group_by_id(id).await?
            .ok_or_else(|| missing("group", id))
    }

    pub async fn group_by_name(&self, name: &str) -> Result<Option<Group>, Error> {
        Ok(self.wf_platform.get_group_by_name(name).await?)
    }

    pub async fn add_user_to_group(
        &self,
        user: &User,
        group: &Group,
    ) -> Result<bool, Error> {
        Ok(self.wf_platform.add_user_to_group(user.id, group.id).await?)
    }

    pub async fn groups_for_user(&self, user: &User) -> Result<Vec<Group>, Error> {
        Ok(self.wf_platform.list_groups_for_user(user.id).await?)
    }
}
