use casbin::{
    CoreApi,
    DefaultModel,
    MemoryAdapter,
    MgmtApi,
};
use wfcore::ac::{
    agent::Agent,
    genpolicy::{
        AgentRole,
        Policy,
        ResGrant,
        RolePermit,
    },
};

use crate::{
    Enforcer,
    builder::{Kind, Builder},
    error::Error,
};

/// The casbin model for workflow permissions.
///
/// `g` holds local roles (agent, role, resource), `g2` holds global
/// roles (agent, role).
pub const DEFAULT_MODEL: &str = "\
[request_definition]
r = sub, res, act

[policy_definition]
p = sub, res, act

[role_definition]
g = _, _, _
g2 = _, _

[policy_effect]
e = some(where (p.eft == allow))

[matchers]
m = (g(r.sub, p.sub, r.res) || g2(r.sub, p.sub)) && keyMatch(r.res, p.res) && (r.act == p.act || p.act == \"*\")
";

/// The default base policy.
///
/// The fields are comma separated in the form of: role, resource, action
const DEFAULT_POLICIES: &str = "\
# Managers can do everything, everywhere
Manager, *, *
";

/// Builds the casbin backed enforcer.
///
/// `CasbinBuilder::default` provides neither a model nor a base policy,
/// while `CasbinBuilder::new` provides both defaults.
#[derive(Clone, Debug, Default)]
pub struct CasbinBuilder {
    pub(crate) anonymous_role: Option<String>,
    pub(crate) base_policy: Box<str>,
    pub(crate) default_model: Box<str>,
    pub(crate) resource_policy: Option<Policy>,
}

impl From<CasbinBuilder> for Builder {
    fn from(mut builder: CasbinBuilder) -> Self {
        Self {
            anonymous_role: builder.anonymous_role.take(),
            resource_policy: builder.resource_policy.take(),
            kind: Kind::Casbin(builder),
        }
    }
}

impl CasbinBuilder {
    pub fn new() -> Self {
        Self {
            base_policy: DEFAULT_POLICIES.into(),
            default_model: DEFAULT_MODEL.into(),
            .. Default::default()
        }
    }

    pub fn anonymous_role(mut self, val: impl Into<String>) -> Self {
        self.anonymous_role = Some(val.into());
        self
    }

    pub fn base_policy(mut self, val: &str) -> Self {
        self.base_policy = val.into();
        self
    }

    pub fn default_model(mut self, val: &str) -> Self {
        self.default_model = val.into();
        self
    }

    pub fn resource_policy(mut self, val: Policy) -> Self {
        self.resource_policy = Some(val);
        self
    }

    pub async fn build(&self) -> Result<CasbinEnforcer, casbin::Error> {
        CasbinEnforcer::new(
            self.anonymous_role.as_deref(),
            &self.base_policy,
            &self.default_model,
            self.resource_policy.clone(),
        ).await
    }
}

pub struct CasbinEnforcer {
    enforcer: casbin::Enforcer,
}

fn parse_policies(policies: &str) -> Vec<Vec<String>> {
    policies.lines()
        .filter_map(|line| {
            let result = line
                .split('#')
                .next()
                .unwrap_or_default()
                .split(", ")
                .map(str::trim)
                .map(str::to_string)
                .collect::<Vec<_>>();
            (result.len() == 3).then_some(result)
        })
        .collect()
}

impl CasbinEnforcer {
    pub async fn new(
        anonymous_role: Option<&str>,
        policies: &str,
        model: &str,
        resource_policy: Option<Policy>,
    ) -> Result<Self, casbin::Error> {
        let m = DefaultModel::from_str(model).await?;
        let a = MemoryAdapter::default();
        let enforcer = casbin::Enforcer::new(m, a).await?;
        let mut result = Self { enforcer };

        let policies = parse_policies(policies);
        let n = policies.len();
        if n > 0 {
            result.enforcer.add_named_policies("p", policies).await?;
        }
        log::debug!("new CasbinEnforcer set up with {n} policies");

        if let Some(role) = anonymous_role {
            log::debug!("new CasbinEnforcer granting every agent role {role}");
            result.grant_agent_role(None::<&str>, role).await?;
            if let Some(name) = resource_policy.as_ref()
                .and_then(|policy| policy.agent.name())
            {
                result.grant_agent_role(Some(name), role).await?;
            }
        }
        if let Some(resource_policy) = resource_policy {
            log::debug!("new CasbinEnforcer has additional resource policies");
            result.set_resource_policy(resource_policy).await?;
        }
        Ok(result)
    }

    fn to_agent(agent: Option<impl AsRef<str> + std::fmt::Display>) -> String {
        agent.map(|agent| format!("u:{agent}"))
            .unwrap_or("-".to_string())
    }

    /// Grant agent the role globally, enabling the role for every
    /// resource that has a policy attached for the role.
    pub async fn grant_agent_role(
        &mut self,
        agent: Option<impl AsRef<str> + std::fmt::Display>,
        role: impl Into<String>,
    ) -> Result<bool, casbin::Error> {
        self.enforcer.add_named_grouping_policy("g2", vec![
            Self::to_agent(agent),
            role.into(),
        ]).await
    }

    /// Grant agent the role locally at the resource.
    pub async fn grant_res(
        &mut self,
        agent: Option<impl AsRef<str> + std::fmt::Display>,
        role: impl Into<String>,
        resource: impl Into<String>,
    ) -> Result<bool, casbin::Error> {
        self.enforcer.add_named_grouping_policy("g", vec![
            Self::to_agent(agent),
            role.into(),
            resource.into(),
        ]).await
    }

    /// Permit the role the action at the resource.
    pub async fn attach_policy(
        &mut self,
        role: impl Into<String>,
        resource: impl Into<String>,
        action: impl Into<String>,
    ) -> Result<bool, casbin::Error> {
        self.enforcer.add_named_policy("p", vec![
            role.into(),
            resource.into(),
            action.into(),
        ]).await
    }

    pub async fn set_resource_policy(
        &mut self,
        policy: Policy,
    ) -> Result<(), casbin::Error> {
        for AgentRole { agent, role } in policy.agent_roles.into_iter() {
            self.grant_agent_role(agent, role).await?;
        }
        for ResGrant { res, agent, role } in policy.res_grants.into_iter() {
            self.grant_res(agent, role, res).await?;
        }
        for RolePermit { role, action } in policy.role_permits.into_iter() {
            self.attach_policy(role, policy.resource.clone(), action).await?;
        }
        Ok(())
    }

    fn casbin_enforce(
        &self,
        agent: Option<impl AsRef<str> + std::fmt::Display>,
        resource: impl AsRef<str>,
        action: impl AsRef<str>,
    ) -> Result<bool, casbin::Error> {
        self.enforcer.enforce((
            Self::to_agent(agent).as_str(),
            resource.as_ref(),
            action.as_ref(),
        ))
    }
}

impl Enforcer for CasbinEnforcer {
    fn enforce(&self, agent: &Agent, res: &str, action: &str) -> Result<bool, Error> {
        Ok(self.casbin_enforce(agent.name(), res, action)?)
    }
}
