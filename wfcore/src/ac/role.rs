use serde::{Deserialize, Serialize};

/// A named bundle of responsibilities, e.g. "Owner" or "Reviewer".
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Deserialize, Serialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Role {
    pub id: i64,
    pub name: String,
}

/// A named capability.  The `codename` is the stable identifier used
/// when checking for the permission, e.g. "view" or "edit".
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Deserialize, Serialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Permission {
    pub id: i64,
    pub name: String,
    pub codename: String,
}

/// Restricts which object permission grants a revocation applies to.
/// A `None` field matches everything; an empty list matches nothing.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct PermissionFilter {
    pub roles: Option<Vec<i64>>,
    pub permissions: Option<Vec<i64>>,
}

mod impls;
