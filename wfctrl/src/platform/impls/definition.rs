use wfcore::{
    ac::role::{
        Permission,
        Role,
    },
    error::ConfigurationError,
    workflow::{
        State,
        States,
        Transition,
        Transitions,
        Workflow,
    },
};

use crate::{
    error::Error,
    platform::Platform,
};

fn cross_workflow(kind: &'static str, name: &str, workflow: &Workflow) -> Error {
    ConfigurationError::CrossWorkflow {
        kind,
        name: name.to_string(),
        workflow: workflow.name.clone(),
    }.into()
}

fn conflict(kind: &'static str, name: &str, workflow: &Workflow) -> Error {
    ConfigurationError::Conflict {
        kind,
        name: name.to_string(),
        workflow: workflow.name.clone(),
    }.into()
}

// Definition store.  Every mutation is get-or-create, so rebuilding the
// same definitions converges; redefining an existing name differently is
// a configuration error.
impl Platform {
    pub async fn create_workflow(
        &self,
        name: &str,
    ) -> Result<Workflow, Error> {
        Ok(self.wf_platform.add_workflow(name).await?)
    }

    pub async fn add_state(
        &self,
        workflow: &Workflow,
        name: &str,
        alias: Option<&str>,
    ) -> Result<State, Error> {
        if let Some(state) = self.wf_platform
            .get_state_by_name(workflow.id, name)
            .await?
        {
            return if state.alias.as_deref() == alias {
                Ok(state)
            } else {
                Err(conflict("state", name, workflow))
            };
        }
        Ok(self.wf_platform.add_state(workflow.id, name, alias).await?)
    }

    pub async fn add_transition(
        &self,
        workflow: &Workflow,
        name: &str,
        destination: Option<&State>,
        permission: Option<&Permission>,
        condition: Option<&str>,
        description: Option<&str>,
    ) -> Result<Transition, Error> {
        if let Some(destination) = destination {
            if destination.workflow_id != workflow.id {
                return Err(cross_workflow("state", &destination.name, workflow));
            }
        }
        let destination_id = destination.map(|state| state.id);
        let permission_id = permission.map(|permission| permission.id);
        if let Some(transition) = self.wf_platform
            .get_transition_by_name(workflow.id, name)
            .await?
        {
            return if transition.destination_id == destination_id
                && transition.permission_id == permission_id
                && transition.condition.as_deref() == condition
                && transition.description.as_deref() == description
            {
                Ok(transition)
            } else {
                Err(conflict("transition", name, workflow))
            };
        }
        Ok(self.wf_platform.add_transition(
            workflow.id,
            name,
            destination_id,
            permission_id,
            condition,
            description,
        ).await?)
    }

    /// Appends the transition to the outbound transitions of the state.
    /// Returns false if it was already linked.
    pub async fn link_state_transition(
        &self,
        state: &State,
        transition: &Transition,
    ) -> Result<bool, Error> {
        if state.workflow_id != transition.workflow_id {
            return Err(ConfigurationError::CrossWorkflow {
                kind: "transition",
                name: transition.name.clone(),
                workflow: state.workflow_name.clone(),
            }.into());
        }
        Ok(self.wf_platform.link_state_transition(state.id, transition.id).await?)
    }

    /// Designates the initial state of the workflow, returning the
    /// updated workflow.
    pub async fn set_workflow_initial_state(
        &self,
        workflow: &Workflow,
        state: &State,
    ) -> Result<Workflow, Error> {
        if state.workflow_id != workflow.id {
            return Err(cross_workflow("state", &state.name, workflow));
        }
        if workflow.initial_state_id != Some(state.id) {
            self.wf_platform.set_workflow_initial_state(workflow.id, state.id).await?;
            self.cache.clear();
        }
        Ok(Workflow {
            initial_state_id: Some(state.id),
            .. workflow.clone()
        })
    }

    pub async fn add_state_permission_grant(
        &self,
        state: &State,
        role: &Role,
        permission: &Permission,
    ) -> Result<bool, Error> {
        Ok(self.wf_platform.add_state_permission_grant(
            state.id,
            role.id,
            permission.id,
        ).await?)
    }

    pub async fn add_workflow_permission(
        &self,
        workflow: &Workflow,
        permission: &Permission,
    ) -> Result<bool, Error> {
        Ok(self.wf_platform.add_workflow_permission(workflow.id, permission.id).await?)
    }
}

// Lookups
impl Platform {
    pub async fn workflows(&self) -> Result<Vec<Workflow>, Error> {
        Ok(self.wf_platform.list_workflows().await?)
    }

    pub async fn workflow_by_id(&self, id: i64) -> Result<Option<Workflow>, Error> {
        Ok(self.wf_platform.get_workflow_by_id(id).await?)
    }

    pub async fn workflow_by_name(&self, name: &str) -> Result<Option<Workflow>, Error> {
        Ok(self.wf_platform.get_workflow_by_name(name).await?)
    }

    pub async fn state_by_name(
        &self,
        workflow: &Workflow,
        name: &str,
    ) -> Result<Option<State>, Error> {
        Ok(self.wf_platform.get_state_by_name(workflow.id, name).await?)
    }

    pub async fn transition_by_name(
        &self,
        workflow: &Workflow,
        name: &str,
    ) -> Result<Option<Transition>, Error> {
        Ok(self.wf_platform.get_transition_by_name(workflow.id, name).await?)
    }

    pub async fn workflow_permissions(
        &self,
        workflow: &Workflow,
    ) -> Result<Vec<Permission>, Error> {
        Ok(self.wf_platform.list_workflow_permissions(workflow.id).await?)
    }

    /// The designated initial state, or the first state of the
    /// workflow if none was designated.
    pub async fn initial_state(
        &self,
        workflow: &Workflow,
    ) -> Result<Option<State>, Error> {
        if let Some(id) = workflow.initial_state_id {
            if let Some(state) = self.wf_platform.get_state_by_id(id).await? {
                return Ok(Some(state));
            }
            log::warn!("initial state {id} of workflow {workflow} is missing");
        }
        Ok(self.wf_platform
            .list_states(workflow.id)
            .await?
            .into_iter()
            .next())
    }

    /// Outbound transitions of the state, in link order.
    pub async fn state_transitions(
        &self,
        state: &State,
    ) -> Result<Transitions, Error> {
        Ok(self.wf_platform.list_state_transitions(state.id).await?)
    }

    pub async fn states(&self, workflow: &Workflow) -> Result<States, Error> {
        Ok(self.wf_platform.list_states(workflow.id).await?)
    }

    async fn states_by_outbound(
        &self,
        workflow: &Workflow,
        has_outbound: bool,
    ) -> Result<States, Error> {
        let mut result = Vec::new();
        for state in self.states(workflow).await?.into_iter() {
            if self.state_transitions(&state).await?.is_empty() != has_outbound {
                result.push(state);
            }
        }
        Ok(result.into())
    }

    /// States without any outbound transition.
    pub async fn final_states(&self, workflow: &Workflow) -> Result<States, Error> {
        self.states_by_outbound(workflow, false).await
    }

    /// States with at least one outbound transition.
    pub async fn active_states(&self, workflow: &Workflow) -> Result<States, Error> {
        self.states_by_outbound(workflow, true).await
    }
}
