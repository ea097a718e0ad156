use std::{
    collections::BTreeMap,
    ops::Deref,
    str::FromStr,
};
use crate::error::ConfigurationError;
use super::{
    *,
    parse::parse_workflow,
};

impl Deref for WorkflowConfigs {
    type Target = BTreeMap<String, WorkflowConfig>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl TryFrom<&serde_json::Value> for WorkflowConfigs {
    type Error = ConfigurationError;

    fn try_from(value: &serde_json::Value) -> Result<Self, Self::Error> {
        let items = value.as_object()
            .ok_or_else(|| ConfigurationError::Malformed(
                "expected a mapping keyed by entity kind".to_string()
            ))?;
        items.iter()
            .map(|(kind, item)| Ok((kind.clone(), parse_workflow(kind, item)?)))
            .collect::<Result<BTreeMap<_, _>, _>>()
            .map(Self)
    }
}

impl FromStr for WorkflowConfigs {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: serde_json::Value = serde_json::from_str(s)
            .map_err(|e| ConfigurationError::Malformed(e.to_string()))?;
        (&value).try_into()
    }
}

impl WorkflowConfigs {
    pub fn for_kind(&self, kind: &str) -> Option<&WorkflowConfig> {
        self.0.get(kind)
    }

    pub fn insert(&mut self, kind: impl Into<String>, config: WorkflowConfig) {
        self.0.insert(kind.into(), config);
    }

    /// Adds every entry of `other`, replacing existing kinds.
    pub fn merge(&mut self, other: WorkflowConfigs) {
        self.0.extend(other.0);
    }
}

impl WorkflowConfig {
    /// The initial state followed by the remaining states, in
    /// declaration order.
    pub fn all_states(&self) -> impl Iterator<Item = &StateConfig> {
        std::iter::once(&self.initial_state).chain(self.states.iter())
    }

    pub fn permission(&self, codename: &str) -> Option<&PermissionConfig> {
        self.permissions.iter().find(|p| p.codename == codename)
    }
}
