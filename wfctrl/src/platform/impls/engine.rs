use wfcore::{
    ac::agent::Agent,
    entity::{
        EntityRef,
        WorkflowAware,
    },
    workflow::{
        HistoryEntry,
        State,
        StateChange,
        Transition,
        TransitionRef,
        Transitions,
    },
};

use crate::{
    error::Error,
    platform::Platform,
};

// Transition engine
impl Platform {
    /// Outbound transitions of the current state of the entity that the
    /// actor is permitted to take, in link order.  Empty if the entity
    /// has no stored state.
    pub async fn allowed_transitions(
        &self,
        entity: &EntityRef,
        actor: &Agent,
    ) -> Result<Transitions, Error> {
        self.allowed_transitions_guarded(entity, actor, |_| true).await
    }

    /// As [`Platform::allowed_transitions`], further filtered by the
    /// caller's evaluation of the guard condition of each transition.
    pub async fn allowed_transitions_guarded(
        &self,
        entity: &EntityRef,
        actor: &Agent,
        guard: impl Fn(&Transition) -> bool,
    ) -> Result<Transitions, Error> {
        let Some(state) = self.resolve_state(entity).await? else {
            return Ok(Transitions::default());
        };
        let mut result = Vec::new();
        for transition in self.state_transitions(&state).await?.into_iter() {
            if !guard(&transition) {
                continue;
            }
            if self.transition_permitted(entity, actor, &transition).await? {
                result.push(transition);
            }
        }
        Ok(result.into())
    }

    async fn transition_permitted(
        &self,
        entity: &EntityRef,
        actor: &Agent,
        transition: &Transition,
    ) -> Result<bool, Error> {
        let Some(permission_id) = transition.permission_id else {
            return Ok(true);
        };
        match self.wf_platform.get_permission_by_id(permission_id).await? {
            Some(permission) => self.has_permission(entity, actor, &permission.codename).await,
            None => {
                log::warn!(
                    "transition {transition} requires missing permission {permission_id}"
                );
                Ok(false)
            }
        }
    }

    /// Looks up the transition named by the reference, within the
    /// workflow of the given state.
    async fn find_transition(
        &self,
        entity: &EntityRef,
        state: &State,
        transition: TransitionRef<'_>,
    ) -> Result<Option<Transition>, Error> {
        Ok(match transition {
            TransitionRef::Transition(transition) => Some(transition.clone()),
            TransitionRef::Id(id) => self.wf_platform.get_transition_by_id(id).await?,
            TransitionRef::Name(name) => {
                let workflow_id = self.resolve_workflow(entity)
                    .await?
                    .map(|workflow| workflow.id)
                    .unwrap_or(state.workflow_id);
                self.wf_platform.get_transition_by_name(workflow_id, name).await?
            }
        })
    }

    /// Takes the transition if the actor is currently allowed to.
    /// Returns false, leaving everything untouched, when the transition
    /// does not exist, is not available from the current state, is not
    /// permitted, or the state changed underneath.
    pub async fn attempt_transition<'a, E: WorkflowAware + ?Sized>(
        &self,
        entity: &mut E,
        transition: impl Into<TransitionRef<'a>>,
        actor: &Agent,
        comment: Option<&str>,
    ) -> Result<bool, Error> {
        self.attempt_transition_guarded(entity, transition, actor, comment, |_| true).await
    }

    /// As [`Platform::attempt_transition`], where the transition must
    /// also pass the caller's evaluation of its guard condition.
    pub async fn attempt_transition_guarded<'a, E: WorkflowAware + ?Sized>(
        &self,
        entity: &mut E,
        transition: impl Into<TransitionRef<'a>>,
        actor: &Agent,
        comment: Option<&str>,
        guard: impl Fn(&Transition) -> bool,
    ) -> Result<bool, Error> {
        let entity_ref = entity.entity_ref();
        let transition = transition.into();
        let Some(state) = self.resolve_state(&entity_ref).await? else {
            log::debug!("{entity_ref} has no state; cannot take {transition:?}");
            return Ok(false);
        };
        let Some(transition) = self.find_transition(&entity_ref, &state, transition).await? else {
            log::debug!("{entity_ref} has no such transition");
            return Ok(false);
        };
        let allowed = self.allowed_transitions_guarded(&entity_ref, actor, guard).await?;
        if !allowed.contains_id(transition.id) {
            log::debug!("{entity_ref}: transition {transition} not available to {actor}");
            return Ok(false);
        }

        let workflow_id = self.resolve_workflow(&entity_ref)
            .await?
            .map(|workflow| workflow.id)
            .unwrap_or(state.workflow_id);
        // a transition without a destination stays in the current state
        let target_state_id = transition.destination_id.unwrap_or(state.id);
        let applied = self.wf_platform.apply_state_change(&StateChange {
            entity: entity_ref.clone(),
            workflow_id,
            source_state_id: Some(Some(state.id)),
            target_state_id,
            history: Some(HistoryEntry {
                transition_id: Some(transition.id),
                actor_id: actor.user_id(),
                comment: comment.map(str::to_string),
            }),
        }).await?;
        if applied {
            entity.set_current_state_id(Some(target_state_id));
            log::debug!("{entity_ref}: {actor} took transition {transition}");
        }
        Ok(applied)
    }

    /// Puts the entity into the state and regrants its permissions,
    /// without consulting transitions or writing history.
    pub async fn set_state<E: WorkflowAware + ?Sized>(
        &self,
        entity: &mut E,
        state: &State,
    ) -> Result<(), Error> {
        let entity_ref = entity.entity_ref();
        let workflow_id = self.resolve_workflow(&entity_ref)
            .await?
            .map(|workflow| workflow.id)
            .unwrap_or(state.workflow_id);
        self.wf_platform.apply_state_change(&StateChange {
            entity: entity_ref,
            workflow_id,
            source_state_id: None,
            target_state_id: state.id,
            history: None,
        }).await?;
        entity.set_current_state_id(Some(state.id));
        Ok(())
    }

    /// Puts the entity into the initial state of the workflow it
    /// resolves to.  Returns the state, or `None` if the entity has no
    /// workflow or the workflow has no states.
    pub async fn set_initial_state<E: WorkflowAware + ?Sized>(
        &self,
        entity: &mut E,
    ) -> Result<Option<State>, Error> {
        let Some(workflow) = self.resolve_workflow(&entity.entity_ref()).await? else {
            return Ok(None);
        };
        let Some(state) = self.initial_state(&workflow).await? else {
            return Ok(None);
        };
        self.set_state(entity, &state).await?;
        Ok(Some(state))
    }

    /// Whether the stored state of the entity has the given name.
    pub async fn is_in_state(
        &self,
        entity: &EntityRef,
        name: &str,
    ) -> Result<bool, Error> {
        Ok(self.resolve_state(entity)
            .await?
            .map(|state| state.name == name)
            .unwrap_or(false))
    }
}
