use std::collections::BTreeSet;
use super::*;

impl Policy {
    /// All roles held by the agent for the resource, global or local.
    pub fn to_roles(&self) -> BTreeSet<&str> {
        self.agent_roles
            .iter()
            .map(|v| v.role.as_str())
            .chain(self.res_grants.iter().map(|v| v.role.as_str()))
            .collect()
    }

    /// Whether any role held by the agent was permitted the action.
    pub fn permits(&self, action: &str) -> bool {
        let roles = self.to_roles();
        self.role_permits
            .iter()
            .any(|v| v.action == action && roles.contains(v.role.as_str()))
    }
}
