use serde::{Deserialize, Serialize};
use super::user::{
    Group,
    User,
};

/// Something that may hold roles: an individual user or a group.
#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd, Deserialize, Serialize)]
pub enum Principal {
    User(User),
    Group(Group),
}

/// The discriminant persisted alongside a principal id.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalKind {
    User,
    Group,
}

mod impls;
