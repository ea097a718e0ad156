use async_trait::async_trait;
use crate::{
    ac::role::Permission,
    entity::EntityRef,
    error::BackendError,
};
use super::{
    ObjectState,
    State,
    StateChange,
    StatePermissionGrant,
    States,
    Transition,
    Transitions,
    Workflow,
};

/// Persistence for workflow definitions.
///
/// The `add_*` methods have get-or-create semantics keyed by name (or
/// by the full row identity for link tables); they return the existing
/// row when one is already present, regardless of its other fields, so
/// callers are responsible for detecting conflicting redefinitions.
#[async_trait]
pub trait DefinitionBackend {
    async fn add_workflow(
        &self,
        name: &str,
    ) -> Result<Workflow, BackendError>;
    async fn get_workflow_by_id(
        &self,
        id: i64,
    ) -> Result<Option<Workflow>, BackendError>;
    async fn get_workflow_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Workflow>, BackendError>;
    async fn list_workflows(
        &self,
    ) -> Result<Vec<Workflow>, BackendError>;
    async fn set_workflow_initial_state(
        &self,
        workflow_id: i64,
        state_id: i64,
    ) -> Result<bool, BackendError>;

    async fn add_state(
        &self,
        workflow_id: i64,
        name: &str,
        alias: Option<&str>,
    ) -> Result<State, BackendError>;
    async fn get_state_by_id(
        &self,
        id: i64,
    ) -> Result<Option<State>, BackendError>;
    async fn get_state_by_name(
        &self,
        workflow_id: i64,
        name: &str,
    ) -> Result<Option<State>, BackendError>;
    /// States of the workflow in the order they were added.
    async fn list_states(
        &self,
        workflow_id: i64,
    ) -> Result<States, BackendError>;

    async fn add_transition(
        &self,
        workflow_id: i64,
        name: &str,
        destination_id: Option<i64>,
        permission_id: Option<i64>,
        condition: Option<&str>,
        description: Option<&str>,
    ) -> Result<Transition, BackendError>;
    async fn get_transition_by_id(
        &self,
        id: i64,
    ) -> Result<Option<Transition>, BackendError>;
    async fn get_transition_by_name(
        &self,
        workflow_id: i64,
        name: &str,
    ) -> Result<Option<Transition>, BackendError>;
    async fn list_transitions(
        &self,
        workflow_id: i64,
    ) -> Result<Transitions, BackendError>;

    /// Returns false if the link already exists.
    async fn link_state_transition(
        &self,
        state_id: i64,
        transition_id: i64,
    ) -> Result<bool, BackendError>;
    /// Outbound transitions of the state, in the order they were linked.
    async fn list_state_transitions(
        &self,
        state_id: i64,
    ) -> Result<Transitions, BackendError>;

    async fn add_state_permission_grant(
        &self,
        state_id: i64,
        role_id: i64,
        permission_id: i64,
    ) -> Result<bool, BackendError>;
    async fn list_state_permission_grants(
        &self,
        state_id: i64,
    ) -> Result<Vec<StatePermissionGrant>, BackendError>;

    /// Records that the workflow is authoritative over the permission.
    async fn add_workflow_permission(
        &self,
        workflow_id: i64,
        permission_id: i64,
    ) -> Result<bool, BackendError>;
    async fn list_workflow_permissions(
        &self,
        workflow_id: i64,
    ) -> Result<Vec<Permission>, BackendError>;
}

/// Persistence for the type and object bindings and the object states.
#[async_trait]
pub trait BindingBackend {
    async fn get_type_binding(
        &self,
        kind: &str,
    ) -> Result<Option<Workflow>, BackendError>;
    async fn set_type_binding(
        &self,
        kind: &str,
        workflow_id: i64,
    ) -> Result<(), BackendError>;
    /// Returns false if there was no binding.
    async fn remove_type_binding(
        &self,
        kind: &str,
    ) -> Result<bool, BackendError>;
    /// The kinds bound to the workflow.
    async fn list_type_bindings(
        &self,
        workflow_id: i64,
    ) -> Result<Vec<String>, BackendError>;

    async fn get_object_binding(
        &self,
        entity: &EntityRef,
    ) -> Result<Option<Workflow>, BackendError>;
    async fn set_object_binding(
        &self,
        entity: &EntityRef,
        workflow_id: i64,
    ) -> Result<(), BackendError>;
    async fn remove_object_binding(
        &self,
        entity: &EntityRef,
    ) -> Result<bool, BackendError>;
    /// The entities bound to the workflow via an object binding.
    async fn list_object_bindings(
        &self,
        workflow_id: i64,
    ) -> Result<Vec<EntityRef>, BackendError>;

    async fn get_object_state(
        &self,
        entity: &EntityRef,
    ) -> Result<Option<State>, BackendError>;
    /// Every stored object state for instances of the kind.
    async fn list_object_states_for_kind(
        &self,
        kind: &str,
    ) -> Result<Vec<ObjectState>, BackendError>;
}

/// Compound writes that must be observed all at once.
#[async_trait]
pub trait TransitionBackend {
    /// Applies the change as one unit of work.  Returns false without
    /// writing anything if the stored state no longer matches the
    /// expected source state.
    async fn apply_state_change(
        &self,
        change: &StateChange,
    ) -> Result<bool, BackendError>;
    /// Removes the stored state and resets all permission state for the
    /// entity as one unit of work.
    async fn clear_state(
        &self,
        entity: &EntityRef,
    ) -> Result<bool, BackendError>;
}
