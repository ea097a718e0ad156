use std::collections::{
    BTreeMap,
    HashSet,
};
use serde_json::{
    Map,
    Value,
};
use crate::error::ConfigurationError;
use super::*;

type Object = Map<String, Value>;

/// Context for error reporting: the workflow being parsed and the
/// enclosing list, if any.
struct Ctx<'a> {
    workflow: &'a str,
    parent: Option<&'static str>,
}

impl<'a> Ctx<'a> {
    fn top(workflow: &'a str) -> Self {
        Self { workflow, parent: None }
    }

    fn nested(&self, parent: &'static str) -> Self {
        Self { workflow: self.workflow, parent: Some(parent) }
    }

    fn missing(&self, key: &str) -> ConfigurationError {
        match self.parent {
            None => ConfigurationError::MissingKey {
                key: key.to_string(),
                workflow: self.workflow.to_string(),
            },
            Some(parent) => ConfigurationError::MissingNestedKey {
                key: key.to_string(),
                parent: parent.to_string(),
                workflow: self.workflow.to_string(),
            },
        }
    }

    fn invalid(&self, key: &str, expected: &'static str) -> ConfigurationError {
        let key = match self.parent {
            None => key.to_string(),
            Some(parent) => format!("{parent}.{key}"),
        };
        ConfigurationError::InvalidValue {
            key,
            workflow: self.workflow.to_string(),
            expected,
        }
    }

    fn unknown(&self, kind: &'static str, name: &str) -> ConfigurationError {
        ConfigurationError::UnknownReference {
            kind,
            name: name.to_string(),
            workflow: self.workflow.to_string(),
        }
    }

    fn required<'v>(&self, item: &'v Object, key: &str) -> Result<&'v Value, ConfigurationError> {
        item.get(key).ok_or_else(|| self.missing(key))
    }

    fn string(&self, item: &Object, key: &str) -> Result<String, ConfigurationError> {
        self.required(item, key)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.invalid(key, "a string"))
    }

    /// Required key whose value may be null.
    fn nullable_string(&self, item: &Object, key: &str) -> Result<Option<String>, ConfigurationError> {
        match self.required(item, key)? {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s.clone())),
            _ => Err(self.invalid(key, "a string or null")),
        }
    }

    fn optional_string(&self, item: &Object, key: &str) -> Result<Option<String>, ConfigurationError> {
        match item.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(self.invalid(key, "a string")),
        }
    }

    fn list<'v>(&self, value: &'v Value, key: &str) -> Result<&'v Vec<Value>, ConfigurationError> {
        value.as_array().ok_or_else(|| self.invalid(key, "a list"))
    }

    fn object<'v>(&self, value: &'v Value, key: &str) -> Result<&'v Object, ConfigurationError> {
        value.as_object().ok_or_else(|| self.invalid(key, "a mapping"))
    }

    /// Parses each entry of a required list, with errors attributed to
    /// the list as the enclosing parent.
    fn entries<T>(
        &self,
        item: &Object,
        key: &'static str,
        f: impl Fn(&Ctx, &Object) -> Result<T, ConfigurationError>,
    ) -> Result<Vec<T>, ConfigurationError> {
        let nested = self.nested(key);
        self.list(self.required(item, key)?, key)?
            .iter()
            .map(|entry| f(&nested, nested.object(entry, key)?))
            .collect()
    }
}

fn parse_state(ctx: &Ctx, item: &Object) -> Result<StateConfig, ConfigurationError> {
    let state_perm_relation = match item.get("state_perm_relation") {
        None | Some(Value::Null) => Vec::new(),
        Some(_) => ctx.entries(item, "state_perm_relation", |ctx, item| Ok(StatePermConfig {
            role: ctx.string(item, "role")?,
            permission: ctx.string(item, "permission")?,
        }))?,
    };
    Ok(StateConfig {
        name: ctx.string(item, "name")?,
        alias: ctx.optional_string(item, "alias")?,
        state_perm_relation,
    })
}

pub(super) fn parse_workflow(kind: &str, value: &Value) -> Result<WorkflowConfig, ConfigurationError> {
    let item = value.as_object()
        .ok_or_else(|| ConfigurationError::Malformed(format!(
            "configuration for {kind} must be a mapping"
        )))?;
    // the kind identifies the workflow in errors until its name is known
    let name = Ctx::top(kind).string(item, "name")?;
    let ctx = Ctx::top(&name);

    let roles = ctx.list(ctx.required(item, "roles")?, "roles")?
        .iter()
        .map(|v| v.as_str()
            .map(str::to_string)
            .ok_or_else(|| ctx.invalid("roles", "a list of strings")))
        .collect::<Result<Vec<_>, _>>()?;
    let permissions = ctx.entries(item, "permissions", |ctx, item| Ok(PermissionConfig {
        name: ctx.string(item, "name")?,
        codename: ctx.string(item, "codename")?,
    }))?;
    let initial_state = parse_state(
        &ctx.nested("initial_state"),
        ctx.object(ctx.required(item, "initial_state")?, "initial_state")?,
    )?;
    let states = ctx.entries(item, "states", parse_state)?;
    let transitions = ctx.entries(item, "transitions", |ctx, item| Ok(TransitionConfig {
        name: ctx.string(item, "name")?,
        destination: ctx.nullable_string(item, "destination")?,
        permission: ctx.optional_string(item, "permission")?,
        description: ctx.optional_string(item, "description")?,
        condition: ctx.optional_string(item, "condition")?,
    }))?;
    let state_transitions = ctx.object(
        ctx.required(item, "state_transitions")?,
        "state_transitions",
    )?
        .iter()
        .map(|(state, names)| {
            let names = ctx.list(names, "state_transitions")?
                .iter()
                .map(|v| v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| ctx.invalid("state_transitions", "a mapping of lists of strings")))
                .collect::<Result<Vec<_>, _>>()?;
            Ok((state.clone(), names))
        })
        .collect::<Result<BTreeMap<_, _>, ConfigurationError>>()?;
    let user_roles = ctx.entries(item, "user_roles", |ctx, item| Ok(UserRoleConfig {
        user_path: ctx.string(item, "user_path")?,
        role: ctx.string(item, "role")?,
    }))?;

    let config = WorkflowConfig {
        name: name.clone(),
        roles,
        permissions,
        initial_state,
        states,
        transitions,
        state_transitions,
        user_roles,
    };
    validate(&ctx, &config)?;
    Ok(config)
}

fn validate(ctx: &Ctx, config: &WorkflowConfig) -> Result<(), ConfigurationError> {
    let roles = config.roles.iter()
        .map(String::as_str)
        .collect::<HashSet<_>>();
    let permissions = config.permissions.iter()
        .map(|p| p.codename.as_str())
        .collect::<HashSet<_>>();
    let states = config.all_states()
        .map(|s| s.name.as_str())
        .collect::<HashSet<_>>();
    let transitions = config.transitions.iter()
        .map(|t| t.name.as_str())
        .collect::<HashSet<_>>();

    for state in config.all_states() {
        for relation in state.state_perm_relation.iter() {
            if !roles.contains(relation.role.as_str()) {
                return Err(ctx.unknown("role", &relation.role));
            }
            if !permissions.contains(relation.permission.as_str()) {
                return Err(ctx.unknown("permission", &relation.permission));
            }
        }
    }
    for transition in config.transitions.iter() {
        if let Some(destination) = transition.destination.as_deref() {
            if !states.contains(destination) {
                return Err(ctx.unknown("state", destination));
            }
        }
        if let Some(permission) = transition.permission.as_deref() {
            if !permissions.contains(permission) {
                return Err(ctx.unknown("permission", permission));
            }
        }
    }
    for (state, names) in config.state_transitions.iter() {
        if !states.contains(state.as_str()) {
            return Err(ctx.unknown("state", state));
        }
        for name in names {
            if !transitions.contains(name.as_str()) {
                return Err(ctx.unknown("transition", name));
            }
        }
    }
    for user_role in config.user_roles.iter() {
        if !roles.contains(user_role.role.as_str()) {
            return Err(ctx.unknown("role", &user_role.role));
        }
    }
    Ok(())
}
