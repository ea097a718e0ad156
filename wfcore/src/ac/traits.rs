use async_trait::async_trait;
use crate::{
    entity::EntityRef,
    error::BackendError,
};
use super::{
    agent::Agent,
    genpolicy::Policy,
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
};

#[async_trait]
pub trait PrincipalBackend {
    async fn add_user(
        &self,
        name: &str,
    ) -> Result<i64, BackendError>;
    async fn get_user_by_id(
        &self,
        id: i64,
    ) -> Result<Option<User>, BackendError>;
    async fn get_user_by_name(
        &self,
        name: &str,
    ) -> Result<Option<User>, BackendError>;
    async fn add_group(
        &self,
        name: &str,
    ) -> Result<i64, BackendError>;
    async fn get_group_by_id(
        &self,
        id: i64,
    ) -> Result<Option<Group>, BackendError>;
    async fn get_group_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Group>, BackendError>;
    /// Returns false if the user was already a member.
    async fn add_user_to_group(
        &self,
        user_id: i64,
        group_id: i64,
    ) -> Result<bool, BackendError>;
    async fn list_groups_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<Group>, BackendError>;
}

#[async_trait]
pub trait PermissionBackend {
    /// Get-or-create; registering an existing name returns it as is.
    async fn register_role(
        &self,
        name: &str,
    ) -> Result<Role, BackendError>;
    async fn get_role_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Role>, BackendError>;
    /// Get-or-create keyed by codename.
    async fn register_permission(
        &self,
        name: &str,
        codename: &str,
    ) -> Result<Permission, BackendError>;
    async fn get_permission_by_id(
        &self,
        id: i64,
    ) -> Result<Option<Permission>, BackendError>;
    async fn get_permission_by_codename(
        &self,
        codename: &str,
    ) -> Result<Option<Permission>, BackendError>;
    /// Returns false if the grant already exists.
    async fn grant_object_permission(
        &self,
        entity: &EntityRef,
        role_id: i64,
        permission_id: i64,
    ) -> Result<bool, BackendError>;
    /// Returns the number of grants removed.
    async fn revoke_object_permissions(
        &self,
        entity: &EntityRef,
        filter: &PermissionFilter,
    ) -> Result<u64, BackendError>;
    /// Grant a global role.  Returns false if already held.
    async fn add_role(
        &self,
        principal: &Principal,
        role_id: i64,
    ) -> Result<bool, BackendError>;
    /// Grant a role scoped to the entity.  Returns false if already held.
    async fn add_local_role(
        &self,
        entity: &EntityRef,
        principal: &Principal,
        role_id: i64,
    ) -> Result<bool, BackendError>;
    async fn remove_local_role(
        &self,
        entity: &EntityRef,
        principal: &Principal,
        role_id: i64,
    ) -> Result<bool, BackendError>;
    /// Clears every object permission and local role for the entity.
    async fn reset(
        &self,
        entity: &EntityRef,
    ) -> Result<(), BackendError>;
    async fn generate_policy_for_agent_entity(
        &self,
        agent: &Agent,
        entity: &EntityRef,
    ) -> Result<Policy, BackendError>;
}
