use wfcore::{
    ac::agent::Agent,
    entity::{
        AttributeSource,
        WorkflowAware,
    },
    workflow::State,
};

use crate::{
    error::Error,
    platform::Platform,
};

// Entity lifecycle hooks
impl Platform {
    /// To be called once the entity has been first persisted.  Puts the
    /// entity into the initial state of the workflow it resolves to,
    /// recording the initial history entry, then binds the configured
    /// roles.  Returns the state the entity is now in.
    pub async fn on_create<E>(
        &self,
        entity: &mut E,
        actor: &Agent,
        comment: Option<&str>,
    ) -> Result<Option<State>, Error>
    where
        E: WorkflowAware + AttributeSource,
    {
        let entity_ref = entity.entity_ref();
        let state = match self.resolve_workflow(&entity_ref).await? {
            Some(workflow) => match self.seed_initial_state(
                &entity_ref,
                &workflow,
                actor.user_id(),
                comment,
            ).await? {
                Some(state) => Some(state),
                // already started, e.g. through an object binding
                None => self.wf_platform.get_object_state(&entity_ref).await?,
            },
            None => {
                log::debug!("{entity_ref} has no workflow");
                None
            }
        };
        entity.set_current_state_id(state.as_ref().map(|state| state.id));
        self.bind_roles(entity).await?;
        Ok(state)
    }

    /// To be called whenever the entity is saved; rebinds the
    /// configured roles, which may follow changed attributes.
    pub async fn on_save<E>(&self, entity: &E) -> Result<usize, Error>
    where
        E: WorkflowAware + AttributeSource,
    {
        self.bind_roles(entity).await
    }
}
