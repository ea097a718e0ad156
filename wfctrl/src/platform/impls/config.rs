use std::collections::HashMap;
use wfcore::{
    ac::role::{
        Permission,
        Role,
    },
    config::{
        StateConfig,
        WorkflowConfig,
        WorkflowConfigs,
    },
    entity::BindingTarget,
    error::ConfigurationError,
    workflow::{
        State,
        Transition,
        Workflow,
    },
};

use crate::{
    error::Error,
    platform::Platform,
};

fn lookup<'a, T>(
    map: &'a HashMap<&str, T>,
    kind: &'static str,
    name: &str,
    config: &WorkflowConfig,
) -> Result<&'a T, ConfigurationError> {
    map.get(name).ok_or_else(|| ConfigurationError::UnknownReference {
        kind,
        name: name.to_string(),
        workflow: config.name.clone(),
    })
}

impl Platform {
    /// Adds the configurations, replacing those of any kind already
    /// present.  Workflows already built from a replaced configuration
    /// are left as they are.
    pub fn load_workflow_config(&self, configs: WorkflowConfigs) {
        for kind in configs.keys() {
            log::debug!("loading workflow configuration for {kind}");
        }
        self.configs.write().merge(configs);
    }

    pub fn workflow_config(&self, kind: &str) -> Option<WorkflowConfig> {
        self.configs.read().for_kind(kind).cloned()
    }

    /// The workflow bound to the kind; when there is none, the workflow
    /// is built from the configuration for the kind and bound to it.
    /// Returns `None` if the kind has neither.
    pub async fn get_or_create_workflow(
        &self,
        kind: &str,
    ) -> Result<Option<Workflow>, Error> {
        if let Some(workflow) = self.wf_platform.get_type_binding(kind).await? {
            return Ok(Some(workflow));
        }
        match self.workflow_config(kind) {
            Some(config) => Ok(Some(
                self.create_workflow_from_config(kind, &config).await?
            )),
            None => Ok(None),
        }
    }

    /// Builds every definition the configuration describes and binds
    /// the resulting workflow to the kind.  Safe to repeat: definitions
    /// that already exist are reused.
    pub async fn create_workflow_from_config(
        &self,
        kind: &str,
        config: &WorkflowConfig,
    ) -> Result<Workflow, Error> {
        log::debug!("building workflow {} for {kind}", config.name);

        let mut roles = HashMap::<&str, Role>::new();
        for name in config.roles.iter() {
            roles.insert(name.as_str(), self.register_role(name).await?);
        }
        let mut permissions = HashMap::<&str, Permission>::new();
        for permission in config.permissions.iter() {
            permissions.insert(
                permission.codename.as_str(),
                self.register_permission(&permission.name, &permission.codename).await?,
            );
        }

        let workflow = self.create_workflow(&config.name).await?;

        let mut states = HashMap::<&str, State>::new();
        for StateConfig { name, alias, state_perm_relation } in config.all_states() {
            let state = self.add_state(&workflow, name, alias.as_deref()).await?;
            for relation in state_perm_relation.iter() {
                self.add_state_permission_grant(
                    &state,
                    lookup(&roles, "role", &relation.role, config)?,
                    lookup(&permissions, "permission", &relation.permission, config)?,
                ).await?;
            }
            states.insert(name.as_str(), state);
        }
        let initial_state = lookup(&states, "state", &config.initial_state.name, config)?;
        let workflow = self.set_workflow_initial_state(&workflow, initial_state).await?;

        for permission in permissions.values() {
            self.add_workflow_permission(&workflow, permission).await?;
        }

        let mut transitions = HashMap::<&str, Transition>::new();
        for transition in config.transitions.iter() {
            let destination = transition.destination
                .as_deref()
                .map(|name| lookup(&states, "state", name, config))
                .transpose()?;
            let permission = transition.permission
                .as_deref()
                .map(|codename| lookup(&permissions, "permission", codename, config))
                .transpose()?;
            transitions.insert(transition.name.as_str(), self.add_transition(
                &workflow,
                &transition.name,
                destination,
                permission,
                transition.condition.as_deref(),
                transition.description.as_deref(),
            ).await?);
        }

        for (state_name, names) in config.state_transitions.iter() {
            let state = lookup(&states, "state", state_name, config)?;
            for name in names.iter() {
                self.link_state_transition(
                    state,
                    lookup(&transitions, "transition", name, config)?,
                ).await?;
            }
        }

        self.bind_workflow(BindingTarget::Kind(kind.to_string()), &workflow).await?;
        Ok(workflow)
    }
}
