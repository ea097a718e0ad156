use wfcore::{
    ac::principal::Principal,
    config::UserRoleConfig,
    entity::{
        Attribute,
        AttributeSource,
        WorkflowAware,
        resolve_path,
    },
};

use crate::{
    error::Error,
    platform::Platform,
};

fn into_principals(
    value: Attribute,
    rule: &UserRoleConfig,
) -> Result<Vec<Principal>, Error> {
    let items = match value {
        Attribute::List(items) => items,
        value => vec![value],
    };
    items.into_iter()
        .map(|item| match item.evaluate() {
            Attribute::Principal(principal) => Ok(principal),
            other => Err(Error::TypeMismatch {
                path: rule.user_path.clone(),
                role: rule.role.clone(),
                found: other.type_name(),
            }),
        })
        .collect()
}

// Role binder
impl Platform {
    /// Grants the roles named by the `user_roles` rules configured for
    /// the kind of the entity as local roles to the principals found at
    /// each rule's attribute path.  A path that cannot be walked, or that
    /// ends at a falsy value, is skipped.  Returns the number of local
    /// roles newly granted.
    pub async fn bind_roles<E>(&self, entity: &E) -> Result<usize, Error>
    where
        E: WorkflowAware + AttributeSource,
    {
        let Some(config) = self.workflow_config(entity.kind()) else {
            return Ok(0);
        };
        let entity_ref = entity.entity_ref();
        let mut granted = 0;
        for rule in config.user_roles.iter() {
            let Some(value) = resolve_path(entity, &rule.user_path) else {
                log::trace!("{entity_ref}: nothing at {}", rule.user_path);
                continue;
            };
            if value.is_falsy() {
                log::trace!("{entity_ref}: falsy value at {}", rule.user_path);
                continue;
            }
            // checked before granting anything for the rule
            let principals = into_principals(value, rule)?;
            // the workflow that registers the role may not have been built
            let role = self.register_role(&rule.role).await?;
            for principal in principals.iter() {
                if self.add_local_role(&entity_ref, principal, &role).await? {
                    log::debug!("{entity_ref}: granted local role {role} to {principal}");
                    granted += 1;
                }
            }
        }
        Ok(granted)
    }
}
