//! Generated Policy
//!
//! The structs provided by this module represents policies generated
//! for consumption by some security enforcer, and is not meant to be
//! persisted in some datastore.

use serde::{Deserialize, Serialize};
use crate::ac::agent::Agent;

/// Grants, roles and permissions associated with the given resource
/// to be passed into the security enforcer as a complete policy.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Policy {
    pub agent: Agent,
    pub resource: String,
    pub agent_roles: Vec<AgentRole>,
    pub res_grants: Vec<ResGrant>,
    pub role_permits: Vec<RolePermit>,
}

/// A resource grant - the agent holds the stated role locally at the
/// given resource.
#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd, Deserialize, Serialize)]
pub struct ResGrant {
    pub res: String,
    pub agent: Option<String>,
    pub role: String,
}

/// This represents the permission codename the role is given for the
/// resource, as derived from the object permissions of the resource.
#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd, Deserialize, Serialize)]
pub struct RolePermit {
    pub role: String,
    pub action: String,
}

/// Represents a role granted to the agent globally, either directly or
/// through one of the groups it belongs to.
#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd, Deserialize, Serialize)]
pub struct AgentRole {
    pub agent: Option<String>,
    pub role: String,
}

mod impls;
