use std::collections::BTreeSet;
use wfcore::{
    entity::{
        BindingTarget,
        EntityRef,
    },
    workflow::{
        HistoryEntry,
        State,
        StateChange,
        Workflow,
    },
};

use crate::{
    error::Error,
    platform::Platform,
};

// Binding resolver
impl Platform {
    /// The workflow for every instance of the kind without an object
    /// binding of its own.  A kind with no type binding yet gets its
    /// workflow built from configuration on first use.
    pub async fn workflow_for_kind(
        &self,
        kind: &str,
    ) -> Result<Option<Workflow>, Error> {
        if let Some(workflow) = self.cache.get(kind) {
            return Ok(Some(workflow));
        }
        let workflow = self.get_or_create_workflow(kind).await?;
        if let Some(workflow) = &workflow {
            self.cache.insert(kind, workflow.clone());
        }
        Ok(workflow)
    }

    /// The object binding of the entity if present, otherwise the
    /// workflow for its kind.
    pub async fn resolve_workflow(
        &self,
        entity: &EntityRef,
    ) -> Result<Option<Workflow>, Error> {
        if let Some(workflow) = self.wf_platform.get_object_binding(entity).await? {
            return Ok(Some(workflow));
        }
        self.workflow_for_kind(&entity.kind).await
    }

    /// The stored state of the entity, if it has started a workflow.
    pub async fn resolve_state(
        &self,
        entity: &EntityRef,
    ) -> Result<Option<State>, Error> {
        let state = self.wf_platform.get_object_state(entity).await?;
        if let Some(state) = &state {
            // rebinding does not migrate stored states
            match self.resolve_workflow(entity).await? {
                Some(workflow) if workflow.id == state.workflow_id => (),
                workflow => log::warn!(
                    "{entity} is in state {state} while resolving to workflow {}",
                    workflow.map(|w| w.name).unwrap_or_else(|| "<none>".to_string()),
                ),
            }
        }
        Ok(state)
    }

    /// Stores the initial state of the workflow for an entity that has
    /// no stored state, recording it as the first history entry.
    /// Returns `None` if the entity already had a state or the workflow
    /// has no states.
    pub(crate) async fn seed_initial_state(
        &self,
        entity: &EntityRef,
        workflow: &Workflow,
        actor_id: Option<i64>,
        comment: Option<&str>,
    ) -> Result<Option<State>, Error> {
        let Some(state) = self.initial_state(workflow).await? else {
            log::warn!("workflow {workflow} has no states to seed {entity} with");
            return Ok(None);
        };
        let applied = self.wf_platform.apply_state_change(&StateChange {
            entity: entity.clone(),
            workflow_id: workflow.id,
            source_state_id: Some(None),
            target_state_id: state.id,
            history: Some(HistoryEntry {
                transition_id: None,
                actor_id,
                comment: comment.map(str::to_string),
            }),
        }).await?;
        if applied {
            log::debug!("{entity} seeded with initial state {state}");
        }
        Ok(applied.then_some(state))
    }

    /// Binds the workflow to every instance of a kind or to a single
    /// instance.  An instance without a stored state is given the
    /// initial state of the workflow.
    pub async fn bind_workflow(
        &self,
        target: impl Into<BindingTarget>,
        workflow: &Workflow,
    ) -> Result<(), Error> {
        match target.into() {
            BindingTarget::Kind(kind) => {
                self.wf_platform.set_type_binding(&kind, workflow.id).await?;
                self.cache.invalidate(&kind);
                log::debug!("bound workflow {workflow} to {kind}");
            }
            BindingTarget::Object(entity) => {
                let current = self.wf_platform.get_object_binding(&entity).await?;
                if current.as_ref().map(|w| w.id) == Some(workflow.id) {
                    return Ok(());
                }
                self.wf_platform.set_object_binding(&entity, workflow.id).await?;
                log::debug!("bound workflow {workflow} to {entity}");
                match self.wf_platform.get_object_state(&entity).await? {
                    None => {
                        self.seed_initial_state(&entity, workflow, None, None).await?;
                    }
                    Some(state) if state.workflow_id != workflow.id => log::warn!(
                        "{entity} keeps state {state} after being bound to {workflow}"
                    ),
                    Some(_) => (),
                }
            }
        }
        Ok(())
    }

    /// Binds the workflow with the given name.  Returns false if no
    /// such workflow exists.
    pub async fn bind_workflow_by_name(
        &self,
        target: impl Into<BindingTarget>,
        name: &str,
    ) -> Result<bool, Error> {
        match self.workflow_by_name(name).await? {
            Some(workflow) => {
                self.bind_workflow(target, &workflow).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Removes the binding.
    ///
    /// For a kind, every instance that resolved to the removed workflow
    /// through the type binding loses its stored state and permissions.
    /// For an instance, its stored state and permissions are cleared and
    /// it is then seeded from whatever workflow it resolves to next.
    pub async fn unbind_workflow(
        &self,
        target: impl Into<BindingTarget>,
    ) -> Result<(), Error> {
        match target.into() {
            BindingTarget::Kind(kind) => {
                let Some(workflow) = self.wf_platform.get_type_binding(&kind).await? else {
                    return Ok(());
                };
                for entity in self.objects_by_type_binding(&kind).await? {
                    self.wf_platform.clear_state(&entity).await?;
                }
                self.wf_platform.remove_type_binding(&kind).await?;
                self.cache.invalidate(&kind);
                log::debug!("unbound workflow {workflow} from {kind}");
            }
            BindingTarget::Object(entity) => {
                self.wf_platform.remove_object_binding(&entity).await?;
                self.wf_platform.clear_state(&entity).await?;
                if let Some(workflow) = self.workflow_for_kind(&entity.kind).await? {
                    self.seed_initial_state(&entity, &workflow, None, None).await?;
                }
                log::debug!("unbound object workflow from {entity}");
            }
        }
        Ok(())
    }

    /// Instances of the kind with a stored state and no object binding.
    async fn objects_by_type_binding(
        &self,
        kind: &str,
    ) -> Result<Vec<EntityRef>, Error> {
        let mut result = Vec::new();
        for object_state in self.wf_platform
            .list_object_states_for_kind(kind)
            .await?
        {
            let entity = object_state.entity;
            if self.wf_platform.get_object_binding(&entity).await?.is_none() {
                result.push(entity);
            }
        }
        Ok(result)
    }

    /// Entities that follow the workflow: those bound to it directly,
    /// and those with a stored state that resolve to it via the type
    /// binding of their kind.
    pub async fn objects_for_workflow(
        &self,
        workflow: &Workflow,
    ) -> Result<Vec<EntityRef>, Error> {
        let mut result = BTreeSet::new();
        for kind in self.wf_platform.list_type_bindings(workflow.id).await? {
            result.extend(self.objects_by_type_binding(&kind).await?);
        }
        result.extend(self.wf_platform.list_object_bindings(workflow.id).await?);
        Ok(result.into_iter().collect())
    }
}
