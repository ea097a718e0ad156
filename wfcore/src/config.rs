//! Declarative workflow configuration.
//!
//! A configuration document is a mapping keyed by the fully qualified
//! entity kind, each value describing the workflow that instances of
//! that kind follow by default.  Parsing validates every required key
//! and every cross reference up front, so a [`WorkflowConfig`] that was
//! successfully produced can be turned into definitions without further
//! configuration errors.

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct WorkflowConfigs(BTreeMap<String, WorkflowConfig>);

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct WorkflowConfig {
    pub name: String,
    pub roles: Vec<String>,
    pub permissions: Vec<PermissionConfig>,
    pub initial_state: StateConfig,
    pub states: Vec<StateConfig>,
    pub transitions: Vec<TransitionConfig>,
    /// Outbound transition names for each state name, in link order.
    pub state_transitions: BTreeMap<String, Vec<String>>,
    pub user_roles: Vec<UserRoleConfig>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct PermissionConfig {
    pub name: String,
    pub codename: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct StateConfig {
    pub name: String,
    pub alias: Option<String>,
    pub state_perm_relation: Vec<StatePermConfig>,
}

/// Grants `permission` (a codename) to `role` while in the state.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct StatePermConfig {
    pub role: String,
    pub permission: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct TransitionConfig {
    pub name: String,
    pub destination: Option<String>,
    /// Codename of the permission required to take the transition.
    pub permission: Option<String>,
    pub description: Option<String>,
    pub condition: Option<String>,
}

/// Grants `role` locally to the principal(s) found by walking
/// `user_path` on the entity.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct UserRoleConfig {
    pub user_path: String,
    pub role: String,
}

mod impls;
mod parse;
