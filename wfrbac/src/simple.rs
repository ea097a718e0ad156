use std::collections::{
    BTreeSet,
    HashMap,
};
use wfcore::ac::genpolicy::Policy;

pub struct ActionRolePermitMap(HashMap<String, BTreeSet<String>>);

/// A simplified enforcer that does a direct check of the roles held by
/// the agent against the roles permitted for the action.  It assumes
/// the policy is fully contained and constrained to the agent and
/// resource that produced it.
pub struct PolicyEnforcer {
    policy: Policy,
    roles: BTreeSet<String>,
    permit_map: ActionRolePermitMap,
}

mod impls;
