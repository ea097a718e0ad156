use wfcore::ac::{
    agent::Agent,
    genpolicy::{
        Policy,
        RolePermit,
    },
};
use std::collections::{
    BTreeSet,
    HashMap,
};

use crate::{
    Enforcer,
    error::Error,
};
use super::*;

impl From<Policy> for PolicyEnforcer {
    fn from(policy: Policy) -> Self {
        // grants recorded against other resources have no bearing here
        let roles = policy.agent_roles
            .iter()
            .map(|v| v.role.clone())
            .chain(policy.res_grants
                .iter()
                .filter(|v| v.res == policy.resource)
                .map(|v| v.role.clone())
            )
            .collect();
        Self {
            roles,
            permit_map: ActionRolePermitMap::from_iter(
                policy.role_permits.clone().into_iter()
            ),
            policy
        }
    }
}

impl From<PolicyEnforcer> for Policy {
    fn from(enforcer: PolicyEnforcer) -> Self {
        enforcer.policy
    }
}

impl FromIterator<RolePermit> for ActionRolePermitMap {
    fn from_iter<I: IntoIterator<Item=RolePermit>>(iter: I) -> Self {
        Self(iter.into_iter()
            .fold(HashMap::new(), |mut m, RolePermit { action, role }| {
                m.entry(action)
                    .or_insert_with(BTreeSet::new)
                    .insert(role);
                m
            })
        )
    }
}

impl ActionRolePermitMap {
    fn permits(&self, action: &str, roles: &BTreeSet<String>) -> bool {
        self.0
            .get(action)
            .map(|permitted| !permitted.is_disjoint(roles))
            .unwrap_or(false)
    }
}

impl Enforcer for PolicyEnforcer {
    fn enforce(&self, agent: &Agent, res: &str, action: &str) -> Result<bool, Error> {
        Ok(
            &self.policy.agent == agent &&
            self.policy.resource == res &&
            (
                self.permit_map.permits(action, &self.roles) ||
                self.permit_map.permits("*", &self.roles)
            )
        )
    }
}

#[cfg(test)]
mod test {
    use wfcore::ac::{
        genpolicy::AgentRole,
        user::User,
    };
    use super::*;

    #[test]
    fn policy_enforcer() -> anyhow::Result<()> {
        let agent: Agent = User {
            id: 1,
            name: "alice".to_owned(),
            created_ts: 123456789,
        }.into();
        // the grant on the other publication must not leak into this one
        let policy: Policy = serde_json::from_str(r#"{
            "agent": {
                "User": {
                    "id": 1,
                    "name": "alice",
                    "created_ts": 123456789
                }
            },
            "resource": "app.Publication:1",
            "agent_roles": [
                {"agent": "alice", "role": "Reader"}
            ],
            "res_grants": [
                {"res": "app.Publication:2", "agent": "alice", "role": "Reviewer"},
                {"res": "app.Publication:1", "agent": "alice", "role": "Owner"}
            ],
            "role_permits": [
                {"role": "Owner", "action": "edit"},
                {"role": "Owner", "action": "view"},
                {"role": "Reviewer", "action": "review"},
                {"role": "Reader", "action": "comment"}
            ]
        }"#)?;
        let enforcer: PolicyEnforcer = policy.into();
        assert!(enforcer.enforce(&agent, "app.Publication:1", "edit")?);
        assert!(enforcer.enforce(&agent, "app.Publication:1", "view")?);
        assert!(enforcer.enforce(&agent, "app.Publication:1", "comment")?);
        assert!(!enforcer.enforce(&agent, "app.Publication:1", "review")?);
        assert!(!enforcer.enforce(&agent, "app.Publication:1", "delete")?);
        // mismatched agent
        assert!(!enforcer.enforce(&Agent::Anonymous, "app.Publication:1", "view")?);
        // mismatched resource
        assert!(!enforcer.enforce(&agent, "app.Publication:2", "review")?);
        Ok(())
    }

    #[test]
    fn wildcard_action() -> anyhow::Result<()> {
        let enforcer = PolicyEnforcer::from(Policy {
            agent: Agent::Anonymous,
            resource: "app.Publication:1".to_string(),
            agent_roles: vec![AgentRole {
                agent: None,
                role: "Manager".to_string(),
            }],
            role_permits: vec![RolePermit {
                role: "Manager".to_string(),
                action: "*".to_string(),
            }],
            .. Default::default()
        });
        assert!(enforcer.enforce(&Agent::Anonymous, "app.Publication:1", "edit")?);
        assert!(enforcer.enforce(&Agent::Anonymous, "app.Publication:1", "")?);
        let policy: Policy = enforcer.into();
        assert_eq!(policy.role_permits.len(), 1);
        Ok(())
    }
}
