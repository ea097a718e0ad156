use serde::{Deserialize, Serialize};
use crate::entity::EntityRef;

/// A named state machine definition.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Workflow {
    pub id: i64,
    pub name: String,
    pub initial_state_id: Option<i64>,
}

#[derive(Clone, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct State {
    pub id: i64,
    pub name: String,
    pub alias: Option<String>,
    pub workflow_id: i64,
    // denormalized from the owning workflow for display.
    pub workflow_name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct States(Vec<State>);

/// An edge to a destination state within the same workflow.  A
/// transition without a destination leaves the state unchanged.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Transition {
    pub id: i64,
    pub name: String,
    pub workflow_id: i64,
    pub destination_id: Option<i64>,
    /// Symbolic guard identifier, resolved and evaluated by the caller.
    pub condition: Option<String>,
    pub permission_id: Option<i64>,
    pub description: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Transitions(Vec<Transition>);

/// While an entity is in `state_id`, the role holds the permission on it.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Deserialize, Serialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StatePermissionGrant {
    pub state_id: i64,
    pub role_id: i64,
    pub permission_id: i64,
}

/// The stored state of an entity instance.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct ObjectState {
    pub entity: EntityRef,
    pub state_id: i64,
}

/// Ways of naming the transition to attempt.
#[derive(Clone, Debug, PartialEq)]
pub enum TransitionRef<'a> {
    Transition(&'a Transition),
    Id(i64),
    Name(&'a str),
}

/// The history entry written alongside a state change.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct HistoryEntry {
    pub transition_id: Option<i64>,
    pub actor_id: Option<i64>,
    pub comment: Option<String>,
}

/// A complete state change, applied as a single unit of work: the
/// object state is set, the object permissions for the workflow are
/// regranted from the target state, and the history entry (if any) is
/// appended.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct StateChange {
    pub entity: EntityRef,
    pub workflow_id: i64,
    /// When set, the change only applies if the stored state still
    /// matches; `None` requires that no state is stored.
    pub source_state_id: Option<Option<i64>>,
    pub target_state_id: i64,
    pub history: Option<HistoryEntry>,
}

#[cfg(feature = "display")]
mod display;
mod impls;
pub mod traits;
