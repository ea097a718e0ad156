use wfcore::ac::genpolicy::{
    AgentRole,
    Policy,
};
use crate::{
    Enforcer,
    error::Error,
    simple::PolicyEnforcer,
};
#[cfg(feature = "casbin")]
use crate::casbin::{
    CasbinBuilder,
    CasbinEnforcer,
};

#[derive(Clone, Debug, Default)]
pub(crate) enum Kind {
    #[default]
    Policy,
    #[cfg(feature = "casbin")]
    Casbin(CasbinBuilder),
}

/// Builds the enforcer that answers permission checks for a single
/// agent at a single entity.
///
/// Methods can be chained in order to set the configuration values.
/// The `Enforcer` is constructed by calling [`build`] or, more
/// typically, [`build_with_policy`] with the policy generated by the
/// backend for the agent and entity in question.
///
/// `Builder::default` produces the simple `PolicyEnforcer`; the casbin
/// backed enforcer is selected by converting a `CasbinBuilder` into
/// this builder.
#[derive(Clone, Debug, Default)]
pub struct Builder {
    pub(crate) anonymous_role: Option<String>,
    pub(crate) resource_policy: Option<Policy>,
    pub(crate) kind: Kind,
}

impl Builder {
    pub fn new() -> Self {
        Default::default()
    }

    /// Role implicitly held by every agent, including the anonymous
    /// one, at every resource.
    pub fn anonymous_role(mut self, val: impl Into<String>) -> Self {
        self.anonymous_role = Some(val.into());
        self
    }

    pub fn resource_policy(mut self, val: Policy) -> Self {
        self.resource_policy = Some(val);
        self
    }

    fn anonymous_role_checked(&self) -> Result<Option<&str>, Error> {
        match self.anonymous_role.as_deref() {
            Some("") => Err(Error::Builder),
            role => Ok(role),
        }
    }

    pub async fn build(&self) -> Result<Box<dyn Enforcer>, Error> {
        log::trace!("building a {}Enforcer", self.kind);
        let policy = self.resource_policy
            .clone()
            .ok_or(Error::PolicyRequired)?;
        self.build_with_policy(policy).await
    }

    pub async fn build_with_policy(
        &self,
        mut policy: Policy,
    ) -> Result<Box<dyn Enforcer>, Error> {
        log::trace!("building a {}Enforcer with {policy:?}", self.kind);
        let anonymous_role = self.anonymous_role_checked()?;
        Ok(match &self.kind {
            Kind::Policy => {
                if let Some(role) = anonymous_role {
                    policy.agent_roles.push(AgentRole {
                        agent: policy.agent.name().map(str::to_string),
                        role: role.to_string(),
                    });
                }
                Box::new(PolicyEnforcer::from(policy))
            }
            #[cfg(feature = "casbin")]
            Kind::Casbin(builder) => Box::new(
                CasbinEnforcer::new(
                    anonymous_role,
                    &builder.base_policy,
                    &builder.default_model,
                    Some(policy),
                ).await?,
            )
        })
    }
}

mod display {
    use std::fmt::{Display, Formatter, Result};
    use super::Kind;

    impl Display for Kind {
        fn fmt(&self, f: &mut Formatter<'_>) -> Result {
            match self {
                Kind::Policy => f.write_str("Policy"),
                #[cfg(feature = "casbin")]
                Kind::Casbin(..) => f.write_str("Casbin"),
            }
        }
    }
}
