//! Workflow-aware entities.
//!
//! Entities live in some external store; this crate only refers to them
//! through the `(kind, id)` pair captured by [`EntityRef`].  Types that
//! take part in workflows implement [`WorkflowAware`], and expose the
//! attributes the role binder walks through [`AttributeSource`].

use serde::{Deserialize, Serialize};
use crate::ac::principal::Principal;

/// The composite key identifying an entity instance.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Deserialize, Serialize)]
pub struct EntityRef {
    pub kind: String,
    pub id: i64,
}

/// The target of a workflow binding: either every instance of a kind,
/// or a single instance.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum BindingTarget {
    Kind(String),
    Object(EntityRef),
}

/// Capability implemented by every entity type that may carry a
/// workflow.  The current state id is a denormalized copy of the stored
/// object state, kept in sync by the engine.
pub trait WorkflowAware: Send + Sync {
    fn kind(&self) -> &str;
    fn id(&self) -> i64;
    fn current_state_id(&self) -> Option<i64>;
    fn set_current_state_id(&mut self, state_id: Option<i64>);

    fn entity_ref(&self) -> EntityRef {
        EntityRef {
            kind: self.kind().to_string(),
            id: self.id(),
        }
    }
}

/// Named attribute lookup, used to walk the `user_path` of a role
/// binding rule.
pub trait AttributeSource {
    fn attribute(&self, name: &str) -> Option<Attribute>;
}

/// A value produced by an attribute lookup.
pub enum Attribute {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    Principal(Principal),
    List(Vec<Attribute>),
    Object(Box<dyn AttributeSource + Send + Sync>),
    Callable(Box<dyn Fn() -> Attribute + Send + Sync>),
}

mod impls;
pub use impls::resolve_path;
